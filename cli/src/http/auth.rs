//! 用户认证路由：注册、登录、获取当前用户

use crate::http::{
    error::ApiError,
    extract::AuthUser,
    models::{LoginRequest, LoginResponse, SignupRequest, SignupResponse},
    AppState,
};
use arena_core::api::{is_valid_email, FieldError, NewUser, StoreError};
use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};

fn validate_signup(req: &SignupRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "Enter a valid email"));
    }
    if req.name.chars().count() < 3 {
        errors.push(FieldError::new("name", "Name must be at least 3 characters"));
    }
    if req.password.chars().count() < 5 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 5 characters",
        ));
    }
    errors
}

fn validate_login(req: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "Enter a valid email"));
    }
    if req.password.is_empty() {
        errors.push(FieldError::new("password", "Password cannot be blank"));
    }
    errors
}

/// 宽松解析请求体：解析失败视为空对象，交给字段校验报错
fn parse_lenient<T: serde::de::DeserializeOwned + Default>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

fn issue_token(state: &AppState, user_id: &str) -> Result<String, ApiError> {
    state
        .ctx
        .signer()
        .sign(user_id)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// POST /api/auth/signup - 注册新用户
pub async fn signup_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SignupResponse>, ApiError> {
    state.record_request("/api/auth/signup");

    let req: SignupRequest = parse_lenient(&body);
    let errors = validate_signup(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let new_user = NewUser {
        name: req.name,
        email: req.email,
        password_hash: state.ctx.hasher().hash(&req.password),
    };

    let user = match state.ctx.store().create_user(new_user).await {
        Ok(user) => user,
        Err(StoreError::Conflict { .. }) => {
            return Err(ApiError::BadRequest("User with this email already exists"));
        }
        Err(e) => {
            state.record_error();
            return Err(e.into());
        }
    };

    tracing::info!(user_id = %user.id, "User signed up");
    let authtoken = issue_token(&state, &user.id)?;
    Ok(Json(SignupResponse {
        success: true,
        authtoken,
        name: user.name,
    }))
}

/// POST /api/auth/login - 登录
pub async fn login_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    state.record_request("/api/auth/login");

    let req: LoginRequest = parse_lenient(&body);
    let errors = validate_login(&req);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = state
        .ctx
        .store()
        .find_user_by_email(&req.email)
        .await?
        .ok_or(ApiError::BadRequest("Invalid Credentials"))?;

    if !state.ctx.hasher().verify(&req.password, &user.password_hash) {
        return Err(ApiError::BadRequest("Invalid Credentials"));
    }

    let authtoken = issue_token(&state, &user.id)?;
    Ok(Json(LoginResponse {
        success: true,
        authtoken,
        name: user.name,
        email: user.email,
    }))
}

/// POST /api/auth/getuser - 当前登录用户信息（不含密码）
pub async fn getuser_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    state.record_request("/api/auth/getuser");

    let user = state
        .ctx
        .store()
        .find_user_by_id(&auth.id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "date": user.date,
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_reports_every_bad_field() {
        let req = SignupRequest {
            name: "ab".into(),
            email: "nope".into(),
            password: "1234".into(),
        };
        let errors = validate_signup(&req);
        assert_eq!(
            errors,
            vec![
                FieldError::new("email", "Enter a valid email"),
                FieldError::new("name", "Name must be at least 3 characters"),
                FieldError::new("password", "Password must be at least 5 characters"),
            ]
        );
    }

    #[test]
    fn login_requires_password() {
        let req = LoginRequest {
            email: "ada@example.com".into(),
            password: String::new(),
        };
        let errors = validate_login(&req);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "password");
    }
}
