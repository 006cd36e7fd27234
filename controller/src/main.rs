mod app;
mod display;
mod host;
mod rtc;
mod server;
mod time_provider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
