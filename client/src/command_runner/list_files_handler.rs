use utilities::logger::{instrument, tracing};

use crate::{error::ClientError, namenode_service::NamenodeService};

pub struct ListFilesHandler {
    namenode: NamenodeService,
}

impl ListFilesHandler {
    pub fn new(namenode: NamenodeService) -> Self {
        Self { namenode }
    }

    #[instrument(name = "client_list_files", skip(self))]
    pub async fn list_files(&self) -> Result<Vec<String>, ClientError> {
        self.namenode.list_files().await
    }
}
