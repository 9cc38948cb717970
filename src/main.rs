#[actix_web::main]
async fn main() -> std::io::Result<()> {
    easydocs_server::run().await
}
