use crate::{
    db::Repository,
    error::{AppError, AppResult},
    models::{NewUser, User},
};

/// Registers a new user unless the email is already taken
pub async fn register<R: Repository + ?Sized>(repo: &R, new_user: NewUser) -> AppResult<User> {
    let email = match new_user.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => return Err(AppError::InvalidInput("Email is required".to_string())),
    };

    if new_user.password.as_deref().map_or(true, str::is_empty) {
        return Err(AppError::InvalidInput("Password is required".to_string()));
    }

    if repo.get_user_by_email(&email).await?.is_some() {
        tracing::info!(email = %email, "Registration rejected, email exists");
        return Err(AppError::Conflict(format!(
            "{} already exists. Please log in or use a different email",
            email
        )));
    }

    let user = repo
        .add_user(NewUser {
            email: Some(email),
            ..new_user
        })
        .await?;

    tracing::info!(user_id = user.user_id, "User registered");
    Ok(user)
}

/// Checks an email and plaintext password against stored credentials
pub async fn login<R: Repository + ?Sized>(
    repo: &R,
    email: &str,
    password: &str,
) -> AppResult<User> {
    match repo.get_user_by_credentials(email, password).await? {
        Some(user) => {
            tracing::info!(user_id = user.user_id, "User logged in");
            Ok(user)
        }
        None => Err(AppError::Unauthorized(format!(
            "{} and password did not match a registered user",
            email
        ))),
    }
}
