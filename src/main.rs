#[tokio::main]
async fn main() {
    let code = caplist::app::startup().await;
    std::process::exit(code);
}
