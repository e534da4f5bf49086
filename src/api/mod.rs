mod handlers;
mod routes;
mod state;

pub use handlers::{
    LoginRequest, MovieDetail, RatingRequest, RatingResponse, SimilarityResponse, UserDetail,
};
pub use routes::create_router;
pub use state::AppState;
