use dpop_binding::app;
use dpop_binding::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    app::run().await
}
