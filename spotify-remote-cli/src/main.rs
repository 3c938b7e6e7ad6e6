use std::process;

#[tokio::main]
async fn main() {
    match spotify_remote::cli::run().await {
        Ok(()) => {}
        Err(err) => {
            println!("{err}");
            process::exit(1);
        }
    }
}
