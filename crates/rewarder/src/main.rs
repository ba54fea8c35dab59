#[tokio::main]
async fn main() {
    rewarder::start(std::env::args()).await;
}
