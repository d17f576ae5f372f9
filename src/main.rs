#[tokio::main]
async fn main() -> std::io::Result<()> {
    stay_backend::run().await
}
