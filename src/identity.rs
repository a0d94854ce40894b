use crate::models::UserId;
use serde::Deserialize;
use tracing::warn;

/// Host-supplied identity, forwarded by the page bootstrap script as query
/// parameters. Every field is optional: outside the chat client none of
/// them are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl HostContext {
    pub fn host_user_id(&self) -> Option<UserId> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .and_then(|id| id.parse().ok())
    }
}

pub fn resolve_user_id(host: &HostContext, fallback: UserId) -> UserId {
    match host.host_user_id() {
        Some(id) => id,
        None => {
            warn!(fallback, "host context has no user id, using fallback identity");
            fallback
        }
    }
}

pub fn greeting(host: &HostContext) -> String {
    let first = non_empty(host.first_name.as_deref());
    let last = non_empty(host.last_name.as_deref());

    if first.is_some() || last.is_some() {
        return format!("{}, Добро пожаловать!", first.unwrap_or_default());
    }
    if let Some(username) = non_empty(host.username.as_deref()) {
        return format!("Добро пожаловать, @{username}!");
    }
    "Добро пожаловать!".to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(user_id: Option<&str>) -> HostContext {
        HostContext {
            user_id: user_id.map(str::to_string),
            ..HostContext::default()
        }
    }

    #[test]
    fn uses_host_user_id_when_present() {
        assert_eq!(resolve_user_id(&host(Some("123")), 470064868), 123);
    }

    #[test]
    fn falls_back_when_missing_or_garbage() {
        assert_eq!(resolve_user_id(&host(None), 470064868), 470064868);
        assert_eq!(resolve_user_id(&host(Some("")), 470064868), 470064868);
        assert_eq!(resolve_user_id(&host(Some("abc")), 7), 7);
    }

    #[test]
    fn greeting_prefers_first_name() {
        let ctx = HostContext {
            first_name: Some("Дмитрий".into()),
            username: Some("dima".into()),
            ..HostContext::default()
        };
        assert_eq!(greeting(&ctx), "Дмитрий, Добро пожаловать!");
    }

    #[test]
    fn greeting_with_only_last_name_keeps_original_wording() {
        let ctx = HostContext {
            last_name: Some("Новиков".into()),
            ..HostContext::default()
        };
        assert_eq!(greeting(&ctx), ", Добро пожаловать!");
    }

    #[test]
    fn greeting_uses_username_then_generic() {
        let ctx = HostContext {
            username: Some("dima".into()),
            ..HostContext::default()
        };
        assert_eq!(greeting(&ctx), "Добро пожаловать, @dima!");
        assert_eq!(greeting(&HostContext::default()), "Добро пожаловать!");
    }
}
