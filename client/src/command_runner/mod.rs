pub mod delete_file_handler;
pub mod fetch_file_handler;
pub mod list_files_handler;
pub mod store_file_handler;

use std::time::Duration;

use delete_file_handler::{DeleteFileHandler, DeleteReport};
use fetch_file_handler::{FetchFileHandler, FetchReport};
use list_files_handler::ListFilesHandler;
use store_file_handler::{StoreFileHandler, StoreReport};
use utilities::tcp_pool::TcpPool;

use crate::{
    config::Config, datanode_locator::DatanodeLocator, datanode_service::DatanodeService,
    error::ClientError, namenode_service::NamenodeService,
};

const HELP: &str = "\
put <local_path> [remote_name] : upload a file (remote name defaults to the file name)
get <remote_name> [local_path] : download a file (defaults to downloaded_<remote_name>)
ls                             : list stored files
rm <remote_name>               : delete a file and its chunks
help                           : show this message
exit                           : quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { local_path: String, remote_name: String },
    Get { remote_name: String, local_path: String },
    Ls,
    Rm { remote_name: String },
    Help,
    Exit,
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, ClientError> {
        let inputs: Vec<&str> = input.split_whitespace().collect();
        let usage = |command: &str| {
            ClientError::Usage(format!(
                "Invalid {command} command usage please use <help> to get help"
            ))
        };
        let command = match inputs.as_slice() {
            ["put", local_path] => Command::Put {
                local_path: local_path.to_string(),
                remote_name: std::path::Path::new(local_path)
                    .file_name()
                    .and_then(|name| name.to_str())
                    .ok_or_else(|| usage("put"))?
                    .to_owned(),
            },
            ["put", local_path, remote_name] => Command::Put {
                local_path: local_path.to_string(),
                remote_name: remote_name.to_string(),
            },
            ["put", ..] => return Err(usage("put")),
            ["get", remote_name] => Command::Get {
                remote_name: remote_name.to_string(),
                local_path: format!("downloaded_{remote_name}"),
            },
            ["get", remote_name, local_path] => Command::Get {
                remote_name: remote_name.to_string(),
                local_path: local_path.to_string(),
            },
            ["get", ..] => return Err(usage("get")),
            ["ls"] => Command::Ls,
            ["rm", remote_name] => Command::Rm {
                remote_name: remote_name.to_string(),
            },
            ["rm", ..] => return Err(usage("rm")),
            ["help"] => Command::Help,
            ["exit"] | ["quit"] => Command::Exit,
            _ => {
                return Err(ClientError::Usage(
                    "Invalid Command Please use valid command use help to list available commands"
                        .to_owned(),
                ));
            }
        };
        Ok(command)
    }
}

pub struct CommandRunner {
    store_file_handler: StoreFileHandler,
    fetch_file_handler: FetchFileHandler,
    delete_file_handler: DeleteFileHandler,
    list_files_handler: ListFilesHandler,
}

impl CommandRunner {
    pub fn new(config: &Config) -> Self {
        let tcp_pool = TcpPool::new(Duration::from_secs(config.request_timeout_secs));
        let namenode = NamenodeService::new(
            config.namenode_addrs.clone(),
            tcp_pool,
            config.max_chunk_size,
        );
        let datanode = DatanodeService::new(tcp_pool, config.max_chunk_size);
        let locator = DatanodeLocator::from_config(config);
        CommandRunner {
            store_file_handler: StoreFileHandler::new(
                namenode.clone(),
                datanode.clone(),
                locator.clone(),
            ),
            fetch_file_handler: FetchFileHandler::new(
                namenode.clone(),
                datanode.clone(),
                locator.clone(),
            ),
            delete_file_handler: DeleteFileHandler::new(namenode.clone(), datanode, locator),
            list_files_handler: ListFilesHandler::new(namenode),
        }
    }

    pub async fn store_file(
        &self,
        local_path: &str,
        remote_name: &str,
    ) -> Result<StoreReport, ClientError> {
        self.store_file_handler
            .store_file(local_path, remote_name)
            .await
    }

    pub async fn fetch_file(
        &self,
        remote_name: &str,
        local_path: &str,
    ) -> Result<FetchReport, ClientError> {
        self.fetch_file_handler
            .fetch_file(remote_name, local_path)
            .await
    }

    pub async fn delete_file(&self, remote_name: &str) -> Result<DeleteReport, ClientError> {
        self.delete_file_handler.delete_file(remote_name).await
    }

    pub async fn list_files(&self) -> Result<Vec<String>, ClientError> {
        self.list_files_handler.list_files().await
    }

    /// Runs one prompt line; `None` means the user asked to leave.
    pub async fn handle_input(&self, input: &str) -> Result<Option<String>, ClientError> {
        let message = match Command::parse(input)? {
            Command::Put {
                local_path,
                remote_name,
            } => {
                let report = self.store_file(&local_path, &remote_name).await?;
                format!(
                    "Stored {} ({} bytes) as {} chunks, {} replicas written",
                    report.file_name, report.file_size, report.chunks, report.replicas_written
                )
            }
            Command::Get {
                remote_name,
                local_path,
            } => {
                let report = self.fetch_file(&remote_name, &local_path).await?;
                format!(
                    "Fetched {} ({} bytes, {} chunks) into {}",
                    report.file_name, report.bytes, report.chunks, report.local_path
                )
            }
            Command::Ls => {
                let files = self.list_files().await?;
                if files.is_empty() {
                    "No files stored".to_owned()
                } else {
                    files.join("\n")
                }
            }
            Command::Rm { remote_name } => {
                let report = self.delete_file(&remote_name).await?;
                let mut message = format!(
                    "Deleted {}: {} replicas removed",
                    report.file_name,
                    report.deleted.len()
                );
                for (chunk_id, datanode_id, reason) in &report.skipped {
                    message.push_str(&format!("\n  skipped {chunk_id} on {datanode_id}: {reason}"));
                }
                message
            }
            Command::Help => HELP.to_owned(),
            Command::Exit => return Ok(None),
        };
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prompt_lines() {
        assert_eq!(
            Command::parse("put ./data/report.txt\n").unwrap(),
            Command::Put {
                local_path: "./data/report.txt".into(),
                remote_name: "report.txt".into()
            }
        );
        assert_eq!(
            Command::parse("get report.txt").unwrap(),
            Command::Get {
                remote_name: "report.txt".into(),
                local_path: "downloaded_report.txt".into()
            }
        );
        assert_eq!(Command::parse("  ls ").unwrap(), Command::Ls);
        assert_eq!(
            Command::parse("rm report.txt").unwrap(),
            Command::Rm {
                remote_name: "report.txt".into()
            }
        );
        assert_eq!(Command::parse("exit").unwrap(), Command::Exit);
    }

    #[test]
    fn rejects_bad_usage() {
        for line in ["", "put", "rm", "rm a b", "get", "fetch a b", "put a b c"] {
            assert!(
                matches!(Command::parse(line), Err(ClientError::Usage(_))),
                "{line:?} accepted"
            );
        }
    }
}
