#[tokio::main]
async fn main() {
    if let Err(e) = postpad::run().await {
        eprintln!("postpad failed: {e}");
        std::process::exit(1);
    }
}
