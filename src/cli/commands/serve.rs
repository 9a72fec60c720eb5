use super::open_store;
use crate::config::Config;
use crate::http::{Server, ServerError};
use crate::worker::CommentWorker;
use crate::{Result, StoreError};

pub(crate) fn handle(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let (worker, join) = CommentWorker::spawn(store)?;
    let worker = worker.with_timeout(config.server.request_timeout());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServerError::Runtime)?;
    let served = runtime.block_on(async {
        let server = Server::bind(
            &config.server.listen_addr,
            worker.clone(),
            &config.comments.schema_version,
        )
        .await?;
        server.run().await
    });

    worker.shutdown();
    drop(worker);
    let halted = match join.join() {
        Ok(store) => store.is_halted(),
        Err(_) => {
            tracing::error!("comment worker panicked");
            false
        }
    };

    served?;
    if halted {
        return Err(StoreError::Halted.into());
    }
    Ok(())
}
