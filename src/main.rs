#[tokio::main]
async fn main() {
    if let Err(e) = intake_lib::run().await {
        eprintln!("intake: {e}");
        std::process::exit(1);
    }
}
