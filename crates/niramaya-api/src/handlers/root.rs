/// Plain-text greeting at `/`
pub async fn welcome() -> &'static str {
    "Welcome to Niramaya"
}
