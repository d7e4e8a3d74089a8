use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Read;
use std::ops::{Add, Sub};
use encoding_rs;

/// 流中的绝对位置
///
/// 与 [`Offset`] 区分开：位置加偏移得到位置，位置相减得到偏移，
/// 两个偏移相加不会得到位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position(pub u64);

/// 相对偏移（可为负，用于预读后回退）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Offset(pub i64);

impl Position {
    pub const START: Position = Position(0);

    /// 位置加偏移；结果为负或溢出时返回 None
    pub fn checked_add(self, offset: Offset) -> Option<Position> {
        self.0.checked_add_signed(offset.0).map(Position)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Offset {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<u32> for Offset {
    fn from(value: u32) -> Self {
        Offset(i64::from(value))
    }
}

impl From<u16> for Offset {
    fn from(value: u16) -> Self {
        Offset(i64::from(value))
    }
}

/// 结果小于 0 时饱和为 0，需要检测越界请用 [`Position::checked_add`]
impl Add<Offset> for Position {
    type Output = Position;

    fn add(self, rhs: Offset) -> Position {
        self.checked_add(rhs).unwrap_or(Position::START)
    }
}

impl Sub for Position {
    type Output = Offset;

    fn sub(self, rhs: Position) -> Offset {
        Offset(self.0 as i64 - rhs.0 as i64)
    }
}

impl std::ops::Neg for Offset {
    type Output = Offset;

    fn neg(self) -> Offset {
        Offset(-self.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// 记录在合并结果中的标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormId(pub u32);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// 插件优先级（加载顺序中从1开始的位置，越大越权威）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u32);

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 定长小端值
///
/// TES 文件中所有整数均为小端序。
pub trait FixedWidth: Sized {
    const WIDTH: u64;

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self>;
}

impl FixedWidth for u8 {
    const WIDTH: u64 = 1;

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        reader.read_u8()
    }
}

impl FixedWidth for u16 {
    const WIDTH: u64 = 2;

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        reader.read_u16::<LittleEndian>()
    }
}

impl FixedWidth for u32 {
    const WIDTH: u64 = 4;

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        reader.read_u32::<LittleEndian>()
    }
}

impl FixedWidth for i32 {
    const WIDTH: u64 = 4;

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        reader.read_i32::<LittleEndian>()
    }
}

impl FixedWidth for f32 {
    const WIDTH: u64 = 4;

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        reader.read_f32::<LittleEndian>()
    }
}

impl FixedWidth for [u8; 4] {
    const WIDTH: u64 = 4;

    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut bytes = [0u8; 4];
        reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

// 支持的编码
const SUPPORTED_ENCODINGS: &[&str] = &["utf-8", "windows-1252", "windows-1250", "windows-1251"];

#[derive(Debug, Clone)]
pub struct RawString {
    pub content: String,
    pub encoding: String,
}

impl RawString {
    /// 尝试多种编码解码
    pub fn decode(data: &[u8]) -> Self {
        for encoding_name in SUPPORTED_ENCODINGS {
            if let Some(encoding) = encoding_rs::Encoding::for_label(encoding_name.as_bytes()) {
                let (decoded, _, had_errors) = encoding.decode(data);
                if !had_errors {
                    return RawString {
                        content: decoded.into_owned(),
                        encoding: encoding_name.to_string(),
                    };
                }
            }
        }

        // 回退到UTF-8，忽略错误
        RawString {
            content: String::from_utf8_lossy(data).into_owned(),
            encoding: "utf-8".to_string(),
        }
    }

    /// Z字符串解析(以null结尾)
    pub fn parse_zstring(data: &[u8]) -> Self {
        let null_pos = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        Self::decode(&data[..null_pos])
    }
}

// 记录标志位定义（只列出合并过程关心的位，其余原样保留）
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecordFlags: u32 {
        const MASTER_FILE = 0x00000001;        // ESM标志
        const DELETED = 0x00000020;            // 已删除
        const LOCALIZED = 0x00000080;          // 本地化（仅TES4头部）
        const LIGHT_MASTER = 0x00000200;       // 轻量级主文件
        const PERSISTENT = 0x00000400;         // 持久化
        const DISABLED = 0x00000800;           // 禁用
        const VISIBLE_DISTANT = 0x00008000;    // 远距离可见
        const COMPRESSED = 0x00040000;         // 压缩
    }
}
