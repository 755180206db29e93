mod auth;
mod blogs;
mod users;

use axum::Router;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/blogs", blogs::routes())
        .nest("/users", users::routes())
}
