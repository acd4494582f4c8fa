use super::datachan::{DataChannel, DataChannelError};
use crate::core_disk::{DiskContext, DiskError, DiskInterface, NetworkFile};
use crate::core_txn::{TransactionService, TxnMode, UnitOfWork};
use crate::helpers::{send_reply, send_response, ControlWriter};
use log::{debug, info, warn};
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Connection(#[from] DataChannelError),

    #[error("Data connection failed: {0}")]
    Socket(io::Error),

    #[error(transparent)]
    Disk(#[from] DiskError),

    #[error("Control connection failed: {0}")]
    Control(io::Error),
}

impl TransferError {
    pub fn reply(&self) -> (u16, &'static str) {
        match self {
            TransferError::Connection(_) => (425, "Can't open data connection"),
            TransferError::Socket(_) | TransferError::Control(_) => {
                (426, "Connection closed; transfer aborted")
            }
            TransferError::Disk(DiskError::DiskFull) => (451, "Disk full"),
            TransferError::Disk(e) => e.reply(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Server to client (RETR).
    Return,
    /// Client to server (STOR, APPE).
    Store,
}

#[derive(Debug)]
pub enum TransferOutcome {
    Complete(u64),
    Aborted(u64),
    Failed(TransferError),
}

/// Everything a transfer needs, so it can run inline or on a worker task.
pub struct TransferJob {
    pub session_id: u32,
    pub transfer_id: u32,
    pub direction: Direction,
    pub writer: ControlWriter,
    pub channel: DataChannel,
    pub disk: Arc<dyn DiskInterface>,
    pub disk_ctx: DiskContext,
    pub transactions: Arc<dyn TransactionService>,
    pub file: NetworkFile,
    /// File offset of the first byte moved.
    pub offset: u64,
    pub buffer_size: usize,
}

/// Runs the transfer, then closes the file and the data channel whatever
/// the result. The caller sends the final reply.
pub async fn execute(mut job: TransferJob) -> TransferOutcome {
    info!(
        "session={} transfer={} {:?} {} from offset {}",
        job.session_id, job.transfer_id, job.direction, job.file.path, job.offset
    );
    job.channel.set_transferring();

    let result = match job.direction {
        Direction::Return => return_data(&mut job).await,
        Direction::Store => store_data(&mut job).await,
    };

    let mut uow = UnitOfWork::new(Arc::clone(&job.transactions), job.session_id);
    uow.begin(match job.direction {
        Direction::Return => TxnMode::ReadOnly,
        Direction::Store => TxnMode::ReadWrite,
    });
    if let Err(e) = job.disk.close_file(&job.disk_ctx, &job.file).await {
        warn!(
            "session={} transfer={} Failed to close {}: {}",
            job.session_id, job.transfer_id, job.file.path, e
        );
    }
    uow.end();
    job.channel.close().await;

    let bytes = job.channel.bytes_transferred();
    match result {
        Ok(true) => {
            info!(
                "session={} transfer={} Complete, {} bytes",
                job.session_id, job.transfer_id, bytes
            );
            TransferOutcome::Complete(bytes)
        }
        Ok(false) => {
            info!(
                "session={} transfer={} Aborted after {} bytes",
                job.session_id, job.transfer_id, bytes
            );
            TransferOutcome::Aborted(bytes)
        }
        Err(e) => {
            info!(
                "session={} transfer={} Failed after {} bytes: {}",
                job.session_id, job.transfer_id, bytes, e
            );
            TransferOutcome::Failed(e)
        }
    }
}

/// Sends the reply that ends a transfer command.
pub async fn send_outcome(writer: &ControlWriter, outcome: &TransferOutcome) -> io::Result<()> {
    match outcome {
        TransferOutcome::Complete(_) => send_reply(writer, 226, "Closing data connection").await,
        TransferOutcome::Aborted(_) => send_reply(writer, 226, "Transfer aborted").await,
        TransferOutcome::Failed(e) => {
            let (code, text) = e.reply();
            send_reply(writer, code, text).await
        }
    }
}

async fn open_data_connection(job: &mut TransferJob) -> Result<(), TransferError> {
    send_response(
        &job.writer,
        b"150 File status okay, about to open data connection\r\n",
    )
    .await
    .map_err(TransferError::Control)?;
    job.channel.acquire_socket().await?;
    Ok(())
}

/// `Ok(false)` when the abort token stopped the transfer.
async fn return_data(job: &mut TransferJob) -> Result<bool, TransferError> {
    open_data_connection(job).await?;

    let abort = job.channel.abort_token();
    let mut buf = vec![0u8; job.buffer_size];
    let mut pos = job.offset;
    loop {
        if abort.is_cancelled() {
            return Ok(false);
        }
        let count = job
            .disk
            .read_file(&job.disk_ctx, &job.file, &mut buf, pos)
            .await?;
        if count == 0 {
            break;
        }
        // the chunk just read is dropped once aborted
        if abort.is_cancelled() {
            return Ok(false);
        }
        let socket = job.channel.acquire_socket().await?;
        tokio::select! {
            biased;
            _ = abort.cancelled() => return Ok(false),
            written = socket.write_all(&buf[..count]) => written.map_err(TransferError::Socket)?,
        }
        pos += count as u64;
        job.channel.add_bytes(count);
    }

    let socket = job.channel.acquire_socket().await?;
    socket.flush().await.map_err(TransferError::Socket)?;
    debug!(
        "session={} transfer={} Sent {} up to offset {}",
        job.session_id, job.transfer_id, job.file.path, pos
    );
    Ok(true)
}

async fn store_data(job: &mut TransferJob) -> Result<bool, TransferError> {
    open_data_connection(job).await?;

    let abort = job.channel.abort_token();
    let mut buf = vec![0u8; job.buffer_size];
    let mut pos = job.offset;
    loop {
        let socket = job.channel.acquire_socket().await?;
        let count = tokio::select! {
            biased;
            _ = abort.cancelled() => return Ok(false),
            read = socket.read(&mut buf) => read.map_err(TransferError::Socket)?,
        };
        if count == 0 {
            break;
        }
        if abort.is_cancelled() {
            return Ok(false);
        }
        job.disk
            .write_file(&job.disk_ctx, &job.file, &buf[..count], pos)
            .await?;
        pos += count as u64;
        job.channel.add_bytes(count);
    }
    debug!(
        "session={} transfer={} Stored {} up to offset {}",
        job.session_id, job.transfer_id, job.file.path, pos
    );
    Ok(!abort.is_cancelled())
}
