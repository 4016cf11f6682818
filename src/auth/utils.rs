use crate::{
    auth::{claims::UserRole, Claims},
    errors::{AppError, AppResult},
};

pub fn is_speaker(claims: &Claims) -> bool {
    matches!(claims.role, UserRole::Speaker | UserRole::Organizer)
}

pub fn require_speaker(claims: &Claims) -> AppResult<()> {
    if !is_speaker(claims) {
        return Err(AppError::Forbidden(
            "Only speakers or organizers can perform this action".to_string(),
        ));
    }
    Ok(())
}

/// Listeners may read their own data; speakers may read anyone's.
pub fn require_self_or_speaker(claims: &Claims, user_id: i64) -> AppResult<()> {
    if !is_speaker(claims) && claims.user_id() != Some(user_id) {
        return Err(AppError::Forbidden(
            "You can only access your own answers".to_string(),
        ));
    }
    Ok(())
}
