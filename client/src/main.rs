use std::io::Write;

use client::{command_runner::CommandRunner, config::Config};
use tokio::io::{AsyncBufReadExt, BufReader};
use utilities::{
    logger::{self, info},
    result::Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let _gaurd = logger::init_logger(
        "Client",
        &config.client_id,
        &config.log_level,
        &config.log_base,
        config.apm_endpoint.as_deref(),
    )?;
    let command_executer = CommandRunner::new(&config);
    info!(namenode = %config.namenode_addrs, "starting the Client");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(input) = lines.next_line().await? else {
            break;
        };
        if input.trim().is_empty() {
            continue;
        }
        match command_executer.handle_input(&input).await {
            Ok(Some(message)) => println!("Success : {}", message),
            Ok(None) => break,
            Err(message) => println!("Error : {}", message),
        }
    }
    info!("Client exiting");
    Ok(())
}
