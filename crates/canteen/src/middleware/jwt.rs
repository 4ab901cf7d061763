use crate::abstract_trait::DynUserQueryRepository;
use axum::{
    Extension, Json,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use shared::{abstract_trait::DynJwtService, errors::ErrorResponse, model::AuthContext};

/// Resolves the acting account from a cookie or bearer token and parks
/// it in the request extensions as an `AuthContext`.
pub async fn auth_middleware(
    cookie_jar: CookieJar,
    Extension(jwt): Extension<DynJwtService>,
    Extension(user_query): Extension<DynUserQueryRepository>,
    mut req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let token = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer ").map(str::to_owned))
        });

    let token = match token {
        Some(token) => token,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::fail(
                    "You are not logged in, please provide token",
                )),
            ));
        }
    };

    let user_id = match jwt.verify_token(&token, "access") {
        Ok(id) => id as i32,
        Err(_) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::fail("Invalid token")),
            ));
        }
    };

    let user = match user_query.find_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::fail("Account no longer exists")),
            ));
        }
        Err(_) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    status: "error".to_string(),
                    message: "Failed to load account".to_string(),
                }),
            ));
        }
    };

    req.extensions_mut().insert(AuthContext {
        account_id: user.user_id,
        role: user.role,
    });

    Ok(next.run(req).await)
}
