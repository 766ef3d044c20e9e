use app::sync::{SyncError, SyncParams, Synchronizer, WriterReporter};
use std::sync::Arc;
use storage::{S3Options, S3Storage};
use utils::app_config::AppConfig;

use crate::SyncArgs;

/// 命令行参数优先，其次是配置文件和S3SYNC_前缀的环境变量
fn pick(cli: Option<String>, config: Option<String>) -> String {
    cli.or(config).unwrap_or_default()
}

pub async fn sync_cmd(args: SyncArgs) -> utils::error::Result<()> {
    let config = AppConfig::fetch()?;
    log::debug!("Loaded configuration: {:?}", config);

    let params = SyncParams {
        bucket: pick(args.bucket, config.s3.bucket),
        connection: S3Options {
            region: pick(args.region, config.s3.region),
            access_key_id: pick(args.access_key_id, config.s3.access_key_id),
            secret_access_key: pick(args.secret_access_key, config.s3.secret_access_key),
            endpoint: args.endpoint.or(config.s3.endpoint),
        },
        source: args.source,
        target: args.target,
        acl: args.acl,
        expires: args.expires,
        delete: args.delete,
        ignore_error: args.ignore_error,
    };
    let request = params.into_request()?;

    let concurrency = args.concurrency.unwrap_or(config.sync.concurrency);
    let page_size = args.page_size.unwrap_or(config.sync.page_size);

    let store = S3Storage::connect(&request.connection)
        .await
        .map_err(SyncError::from)?;
    let synchronizer = Synchronizer::new(Arc::new(store))
        .with_concurrency(concurrency)
        .with_page_size(page_size);

    let mut reporter = WriterReporter::stdout(args.output);
    let result = synchronizer.sync(&request, &mut reporter).await?;

    log::info!("{}", result);
    Ok(())
}
