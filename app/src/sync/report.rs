use std::io::{self, Write};
use std::str::FromStr;

use super::stats::SyncResult;

/// 输出边界 - 在Reporting阶段接收最终结果
pub trait Reporter: Send {
    fn report(&mut self, result: &SyncResult) -> io::Result<()>;
}

/// 在内存中收集结果
impl Reporter for Vec<SyncResult> {
    fn report(&mut self, result: &SyncResult) -> io::Result<()> {
        self.push(*result);
        Ok(())
    }
}

/// 结果输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format '{}', expected text or json", other)),
        }
    }
}

/// 把结果写入任意Writer
pub struct WriterReporter<W> {
    format: OutputFormat,
    writer: W,
}

impl<W: Write + Send> WriterReporter<W> {
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self { format, writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterReporter<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write + Send> Reporter for WriterReporter<W> {
    fn report(&mut self, result: &SyncResult) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.writer, "Outputs:")?;
                for (name, value) in result.outputs() {
                    writeln!(self.writer, "  {}: {}", name, value)?;
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, result)?;
                writeln!(self.writer)?;
            }
        }
        self.writer.flush()
    }
}
