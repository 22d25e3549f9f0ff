#[actix_web::main]
async fn main() {
    if let Err(err) = tbpredict_lib::run().await {
        tracing::error!(error = %err, "tbpredict exited with an error");
        std::process::exit(1);
    }
}
