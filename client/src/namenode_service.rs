use proto::{
    namenode::{NamenodeRequest, NamenodeResponse},
    placement::PlacementPlan,
    wire::{read_body, read_packet, write_message},
};
use utilities::{
    logger::{instrument, trace, tracing},
    tcp_pool::TcpPool,
};

use crate::error::ClientError;

#[derive(Clone, Debug)]
pub struct NamenodeService {
    namenode_addrs: String,
    tcp_pool: TcpPool,
    max_reply_size: u64,
}

impl NamenodeService {
    pub fn new(namenode_addrs: String, tcp_pool: TcpPool, max_reply_size: u64) -> Self {
        Self {
            namenode_addrs,
            tcp_pool,
            max_reply_size,
        }
    }

    async fn exchange(&self, request: NamenodeRequest) -> Result<NamenodeResponse, ClientError> {
        let mut stream = self
            .tcp_pool
            .get_connection(&self.namenode_addrs)
            .await
            .map_err(|source| ClientError::Unreachable {
                addrs: self.namenode_addrs.clone(),
                source,
            })?;
        write_message(&mut stream, request.to_packet(), None).await?;
        let reply = read_packet(&mut stream).await?;
        let body = read_body(&mut stream, &reply, self.max_reply_size).await?;
        let response = NamenodeResponse::decode(&reply, body.as_deref())?;
        trace!(?response, "namenode replied");
        match response {
            NamenodeResponse::Error(e) => Err(e.into()),
            response => Ok(response),
        }
    }

    async fn expect_plan(&self, request: NamenodeRequest) -> Result<PlacementPlan, ClientError> {
        match self.exchange(request).await? {
            NamenodeResponse::Plan(plan) => Ok(plan),
            other => Err(ClientError::UnexpectedReply(format!("{other:?}"))),
        }
    }

    #[instrument(name = "namenode_service_store_file", skip(self))]
    pub async fn store_file(
        &self,
        file_name: &str,
        file_size: u64,
    ) -> Result<PlacementPlan, ClientError> {
        self.expect_plan(NamenodeRequest::StoreFile {
            file_name: file_name.to_owned(),
            file_size,
        })
        .await
    }

    #[instrument(name = "namenode_service_fetch_file", skip(self))]
    pub async fn fetch_file(&self, file_name: &str) -> Result<PlacementPlan, ClientError> {
        self.expect_plan(NamenodeRequest::FetchFile {
            file_name: file_name.to_owned(),
        })
        .await
    }

    #[instrument(name = "namenode_service_delete_file", skip(self))]
    pub async fn delete_file(&self, file_name: &str) -> Result<PlacementPlan, ClientError> {
        self.expect_plan(NamenodeRequest::DeleteFile {
            file_name: file_name.to_owned(),
        })
        .await
    }

    #[instrument(name = "namenode_service_list_files", skip(self))]
    pub async fn list_files(&self) -> Result<Vec<String>, ClientError> {
        match self.exchange(NamenodeRequest::ListFiles).await? {
            NamenodeResponse::Files(files) => Ok(files),
            other => Err(ClientError::UnexpectedReply(format!("{other:?}"))),
        }
    }
}
