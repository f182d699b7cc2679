#[actix_web::main]
async fn main() -> std::io::Result<()> {
    documentos_server::run().await
}
