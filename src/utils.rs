use crate::cursor::StreamFault;
use crate::datatypes::{Position, Priority};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EspError>;

/// 出错位置：字节偏移或文件末尾
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOffset {
    At(Position),
    EndOfFile,
}

impl ErrorOffset {
    /// 位置到达或超过流长度时记为文件末尾
    pub fn within(position: Position, stream_len: u64) -> Self {
        if position.0 >= stream_len {
            ErrorOffset::EndOfFile
        } else {
            ErrorOffset::At(position)
        }
    }
}

impl fmt::Display for ErrorOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorOffset::At(position) => write!(f, "offset {}", position),
            ErrorOffset::EndOfFile => f.write_str("end of file"),
        }
    }
}

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum EspError {
    #[error("{plugin}: not a TES4 plugin, expected TES4 header at {offset} but found {found}")]
    InvalidHeader {
        plugin: String,
        offset: ErrorOffset,
        found: String,
    },

    #[error("{plugin}: malformed stream at {offset}: {reason}")]
    MalformedStream {
        plugin: String,
        offset: ErrorOffset,
        reason: String,
    },

    #[error("{plugin}: size mismatch, expected cursor at {expected} but it is at {actual}")]
    SizeMismatch {
        plugin: String,
        expected: Position,
        actual: Position,
    },

    #[error("{plugin}: input truncated at {offset}")]
    TruncatedInput { plugin: String, offset: ErrorOffset },

    #[error("{plugin}: closed before reaching end of file (stopped at {offset})")]
    UnexpectedEarlyClose { plugin: String, offset: ErrorOffset },

    #[error("Could not find the following plugins:\n{}", .missing.join("\n"))]
    UnresolvedLoadOrderEntries { missing: Vec<String> },

    #[error("{plugin} (priority {priority}) merged after priority {previous}; plugins must be merged in descending priority")]
    OutOfOrderMerge {
        plugin: String,
        priority: Priority,
        previous: Priority,
    },

    #[error("Could not read load order file {}: {source}", .path.display())]
    LoadOrder {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{plugin}: IO error at {offset}: {source}")]
    PluginIo {
        plugin: String,
        offset: ErrorOffset,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EspError {
    /// 将流层面的失败转换为带插件名的错误
    pub fn from_stream(plugin: &str, fault: StreamFault, stream_len: u64) -> Self {
        let offset = ErrorOffset::within(fault.position(), stream_len);
        match fault {
            StreamFault::Io { source, .. } => EspError::plugin_io(plugin, offset, source),
            _ => EspError::TruncatedInput {
                plugin: plugin.to_string(),
                offset,
            },
        }
    }

    /// 打开、映射或读取插件时的IO错误
    pub fn plugin_io(plugin: &str, offset: ErrorOffset, source: std::io::Error) -> Self {
        EspError::PluginIo {
            plugin: plugin.to_string(),
            offset,
            source,
        }
    }

    /// 出错的插件名（与具体插件无关的错误返回 None）
    pub fn plugin(&self) -> Option<&str> {
        match self {
            EspError::InvalidHeader { plugin, .. }
            | EspError::MalformedStream { plugin, .. }
            | EspError::SizeMismatch { plugin, .. }
            | EspError::TruncatedInput { plugin, .. }
            | EspError::UnexpectedEarlyClose { plugin, .. }
            | EspError::PluginIo { plugin, .. }
            | EspError::OutOfOrderMerge { plugin, .. } => Some(plugin),
            _ => None,
        }
    }
}
