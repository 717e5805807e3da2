//! 会话管理
//!
//! 保存 Bearer 令牌；收到 401 时由步骤边界调用 `logout` 清除会话。

use std::sync::RwLock;

use tracing::info;

/// 会话失效钩子
pub trait SessionHandler: Send + Sync {
    /// 清除会话（401 时调用）
    fn logout(&self);
}

/// 令牌存储
#[derive(Debug, Default)]
pub struct TokenManager {
    token: RwLock<Option<String>>,
}

impl TokenManager {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
        }
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
    }

    pub fn clear(&self) {
        match self.token.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

impl SessionHandler for TokenManager {
    fn logout(&self) {
        self.clear();
        info!("🔒 会话已失效，令牌已清除");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_clears_token() {
        let tokens = TokenManager::new(Some("abc".to_string()));
        assert!(tokens.is_authenticated());
        tokens.logout();
        assert!(!tokens.is_authenticated());

        tokens.set_token("def");
        assert_eq!(tokens.token().as_deref(), Some("def"));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        assert!(!TokenManager::new(Some("  ".to_string())).is_authenticated());
    }
}
