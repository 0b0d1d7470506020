use stratus_cleanup::{CleanupHandler, CleanupSettings};
use stratus_cleanup_function::{
    AwsClient, BucketStore, FunctionError, HandlerFunction, KindDispatch, RepositoryStore,
    RuntimeClient, init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), FunctionError> {
    init_tracing();
    let runtime = RuntimeClient::from_env()?;

    let client = match AwsClient::from_env() {
        Ok(client) => client,
        Err(failure) => {
            runtime.fail_init(&failure).await?;
            return Err(failure);
        }
    };
    let settings = CleanupSettings::from_env();
    let function = HandlerFunction::new(KindDispatch::new(
        CleanupHandler::new(BucketStore::new(client.clone()), settings),
        CleanupHandler::new(RepositoryStore::new(client), settings),
    ));

    runtime.serve(&function).await
}
