use stratus_cleanup::{RemoteCleanup, Router};
use stratus_cleanup_function::{
    AwsClient, FunctionError, HttpReplyTransport, LambdaInvoker, RouterFunction, RuntimeClient,
    init_tracing,
};

type Function = RouterFunction<RemoteCleanup<LambdaInvoker>, HttpReplyTransport>;

fn router() -> Result<Function, FunctionError> {
    let invoker = LambdaInvoker::new(AwsClient::from_env()?);
    let cleanup = RemoteCleanup::from_env(invoker)?;
    Ok(RouterFunction::new(Router::new(cleanup), HttpReplyTransport::new()))
}

#[tokio::main]
async fn main() -> Result<(), FunctionError> {
    init_tracing();
    let runtime = RuntimeClient::from_env()?;

    let function = match router() {
        Ok(function) => function,
        Err(failure) => {
            runtime.fail_init(&failure).await?;
            return Err(failure);
        }
    };
    runtime.serve(&function).await
}
