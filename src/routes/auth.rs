use actix_web::{web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AuthMiddleware, AuthUser};
use crate::models::{LoginRequest, SignupRequest, Token, UserResponse};
use crate::services::{AuthService, UserService};
use crate::utils::security::{create_jwt, hash_password};
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/signup", web::post().to(signup))
        .route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout))
        .service(
            web::resource("/me")
                .wrap(AuthMiddleware)
                .route(web::get().to(get_current_user)),
        );
}

/// POST /signup - Register a new user
async fn signup(
    state: web::Data<AppState>,
    req: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_service = UserService::new(&state.db);

    if user_service
        .get_user_by_username(&req.username)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Username already registered".to_string(),
        ));
    }

    if user_service
        .get_user_by_email(&req.email.to_lowercase())
        .await?
        .is_some()
    {
        return Err(AppError::UserAlreadyExists);
    }

    let hashed_password = hash_password(&req.password)?;
    let user = user_service
        .insert_new_user(
            &req.email.to_lowercase(),
            &req.username,
            &hashed_password,
            req.full_name.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// POST /login - Authenticate and return a JWT
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let auth_service = AuthService::new(&state.db);
    let user = auth_service
        .authenticate(&req.username, &req.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = create_jwt(
        &user.id,
        &user.username,
        &state.config.secret_key,
        &state.config.jwt_expires_in,
    )?;

    Ok(HttpResponse::Ok().json(Token {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /me - Current authenticated user
async fn get_current_user(auth_user: AuthUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse::from(auth_user.user)))
}

/// POST /logout - Stateless JWT: the client drops the token
async fn logout() -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully logged out. Please remove the token from client storage."
    })))
}
