use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

/// The caller's session. Absent when the request carried no bearer token;
/// data operations then fail with [`AppError::NotAuthenticated`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<AuthUser>,
}

impl Session {
    pub fn new(user: Option<AuthUser>) -> Self {
        Self { user }
    }

    pub fn for_user(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn require(&self) -> Result<&AuthUser, AppError> {
        self.user.as_ref().ok_or(AppError::NotAuthenticated)
    }

    pub fn user_id(&self) -> Result<u64, AppError> {
        self.require().map(|u| u.user_id)
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // auth_middleware stores the verified user in the request extensions
        let user = req.extensions().get::<AuthUser>().cloned();
        ready(Ok(Session::new(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_session_is_not_authenticated() {
        let session = Session::anonymous();
        assert!(session.require().is_err());
        assert!(matches!(session.user_id(), Err(AppError::NotAuthenticated)));
    }

    #[test]
    fn user_session_exposes_owner_id() {
        let session = Session::for_user(AuthUser {
            user_id: 42,
            username: "ms.lee".into(),
            role: Role::Teacher,
        });
        assert_eq!(session.user_id().unwrap(), 42);
    }
}
