//! 4字节类型标识与内部枚举之间的双向映射
//!
//! 对照表按字节序排序，查找用二分；排序/去重在编译期检查。

use std::fmt;

macro_rules! tag_table {
    (
        $(#[$meta:meta])*
        $name:ident, $tags:ident, $variants:ident {
            $($variant:ident => $tag:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant,)*
            /// 未知或无效的标识
            None,
        }

        const $tags: &[[u8; 4]] = &[$(*$tag,)*];
        const $variants: &[$name] = &[$($name::$variant,)*];
    };
}

tag_table! {
    /// 记录类型
    RecordType, RECORD_TAGS, RECORD_VARIANTS {
        Aact => b"AACT", Achr => b"ACHR", Acti => b"ACTI", Addn => b"ADDN",
        Alch => b"ALCH", Ammo => b"AMMO", Anio => b"ANIO", Appa => b"APPA",
        Arma => b"ARMA", Armo => b"ARMO", Arto => b"ARTO", Aspc => b"ASPC",
        Astp => b"ASTP", Avif => b"AVIF", Book => b"BOOK", Bptd => b"BPTD",
        Cams => b"CAMS", Cell => b"CELL", Clas => b"CLAS", Clfm => b"CLFM",
        Clmt => b"CLMT", Cobj => b"COBJ", Coll => b"COLL", Cont => b"CONT",
        Cpth => b"CPTH", Csty => b"CSTY", Debr => b"DEBR", Dial => b"DIAL",
        Dlbr => b"DLBR", Dlvw => b"DLVW", Dobj => b"DOBJ", Door => b"DOOR",
        Dual => b"DUAL", Eczn => b"ECZN", Efsh => b"EFSH", Ench => b"ENCH",
        Equp => b"EQUP", Expl => b"EXPL", Eyes => b"EYES", Fact => b"FACT",
        Flor => b"FLOR", Flst => b"FLST", Fstp => b"FSTP", Fsts => b"FSTS",
        Furn => b"FURN", Glob => b"GLOB", Gmst => b"GMST", Gras => b"GRAS",
        Grup => b"GRUP", Hazd => b"HAZD", Hdpt => b"HDPT", Idle => b"IDLE",
        Idlm => b"IDLM", Imad => b"IMAD", Imgs => b"IMGS", Info => b"INFO",
        Ingr => b"INGR", Ipct => b"IPCT", Ipds => b"IPDS", Keym => b"KEYM",
        Kywd => b"KYWD", Land => b"LAND", Lcrt => b"LCRT", Lctn => b"LCTN",
        Lens => b"LENS", Lgtm => b"LGTM", Ligh => b"LIGH", Lscr => b"LSCR",
        Ltex => b"LTEX", Lvli => b"LVLI", Lvln => b"LVLN", Lvsp => b"LVSP",
        Mato => b"MATO", Matt => b"MATT", Mesg => b"MESG", Mgef => b"MGEF",
        Misc => b"MISC", Movt => b"MOVT", Mstt => b"MSTT", Musc => b"MUSC",
        Must => b"MUST", Navi => b"NAVI", Navm => b"NAVM", Note => b"NOTE",
        Npc => b"NPC_", Otft => b"OTFT", Pack => b"PACK", Perk => b"PERK",
        Pgre => b"PGRE", Phzd => b"PHZD", Proj => b"PROJ", Qust => b"QUST",
        Race => b"RACE", Refr => b"REFR", Regn => b"REGN", Rela => b"RELA",
        Revb => b"REVB", Rfct => b"RFCT", Scen => b"SCEN", Scrl => b"SCRL",
        Shou => b"SHOU", Slgm => b"SLGM", Smbn => b"SMBN", Smen => b"SMEN",
        Smqn => b"SMQN", Snct => b"SNCT", Sndr => b"SNDR", Sopm => b"SOPM",
        Soun => b"SOUN", Spel => b"SPEL", Spgd => b"SPGD", Stat => b"STAT",
        Tact => b"TACT", Tes4 => b"TES4", Tree => b"TREE", Txst => b"TXST",
        Voli => b"VOLI", Vtyp => b"VTYP", Watr => b"WATR", Weap => b"WEAP",
        Woop => b"WOOP", Wrld => b"WRLD", Wthr => b"WTHR",
    }
}

tag_table! {
    /// 记录数据区内的字段类型
    FieldType, FIELD_TAGS, FIELD_VARIANTS {
        Anam => b"ANAM", Avsk => b"AVSK", Cnam => b"CNAM", Ctda => b"CTDA",
        Data => b"DATA", Desc => b"DESC", Edid => b"EDID", Fnam => b"FNAM",
        Full => b"FULL", Hnam => b"HNAM", Icon => b"ICON", Inam => b"INAM",
        Nnam => b"NNAM", Pnam => b"PNAM", Snam => b"SNAM", Vmad => b"VMAD",
        Vnam => b"VNAM", Xnam => b"XNAM", Ynam => b"YNAM",
    }
}

const fn is_strictly_sorted(tags: &[[u8; 4]]) -> bool {
    let mut i = 1;
    while i < tags.len() {
        let (prev, next) = (&tags[i - 1], &tags[i]);
        let mut j = 0;
        let mut less = false;
        while j < 4 {
            if prev[j] < next[j] {
                less = true;
                break;
            }
            if prev[j] > next[j] {
                return false;
            }
            j += 1;
        }
        if !less {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(is_strictly_sorted(RECORD_TAGS));
const _: () = assert!(RECORD_TAGS.len() == RECORD_VARIANTS.len());
const _: () = assert!(RECORD_TAGS.len() == RecordType::None as usize);
const _: () = assert!(is_strictly_sorted(FIELD_TAGS));
const _: () = assert!(FIELD_TAGS.len() == FIELD_VARIANTS.len());
const _: () = assert!(FIELD_TAGS.len() == FieldType::None as usize);

const NONE_TAG: [u8; 4] = *b"NONE";

fn lookup<T: Copy>(tags: &[[u8; 4]], variants: &[T], bytes: &[u8], none: T) -> T {
    if bytes.len() != 4 {
        return none;
    }
    match tags.binary_search_by(|tag| tag.as_slice().cmp(bytes)) {
        Ok(index) => variants[index],
        Err(_) => none,
    }
}

/// 将4字节标识解码为记录类型，未知或长度不对时返回 [`RecordType::None`]
pub fn decode_tag(bytes: &[u8]) -> RecordType {
    lookup(RECORD_TAGS, RECORD_VARIANTS, bytes, RecordType::None)
}

/// 记录类型的4字节表示（诊断用）
pub fn encode_tag(record_type: RecordType) -> [u8; 4] {
    RECORD_TAGS
        .get(record_type as usize)
        .copied()
        .unwrap_or(NONE_TAG)
}

pub fn decode_field_tag(bytes: &[u8]) -> FieldType {
    lookup(FIELD_TAGS, FIELD_VARIANTS, bytes, FieldType::None)
}

pub fn encode_field_tag(field_type: FieldType) -> [u8; 4] {
    FIELD_TAGS
        .get(field_type as usize)
        .copied()
        .unwrap_or(NONE_TAG)
}

impl RecordType {
    pub fn from_tag(bytes: &[u8]) -> Self {
        decode_tag(bytes)
    }

    pub fn tag(self) -> [u8; 4] {
        encode_tag(self)
    }
}

impl FieldType {
    pub fn from_tag(bytes: &[u8]) -> Self {
        decode_field_tag(bytes)
    }

    pub fn tag(self) -> [u8; 4] {
        encode_field_tag(self)
    }
}

/// 原始标识的可读形式，非ASCII字节以十六进制显示
pub fn tag_to_string(tag: &[u8; 4]) -> String {
    if tag.iter().all(|b| b.is_ascii_graphic()) {
        String::from_utf8_lossy(tag).into_owned()
    } else {
        format!("{:02X?}", tag)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tag_to_string(&self.tag()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tag_to_string(&self.tag()))
    }
}
