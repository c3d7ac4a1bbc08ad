// ============================================================================
// HPROF 读取层 - HotSpot heap dump 二进制格式
// ============================================================================
//
// 只实现对象枚举所需的部分：
// - UTF8 / LOAD CLASS 记录 -> 类名解析
// - HEAP DUMP (SEGMENT) 中的 CLASS / INSTANCE / ARRAY 子记录 -> 对象大小
// 其余记录按长度跳过。
//
// ============================================================================

pub mod cursor;
pub mod header;
pub mod reader;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::SnapshotError;

pub use header::{HprofHeader, HprofVersion};
pub use reader::HprofReader;

/// Top-level record tags
pub mod tag {
    pub const UTF8: u8 = 0x01;
    pub const LOAD_CLASS: u8 = 0x02;
    pub const HEAP_DUMP: u8 = 0x0C;
    pub const HEAP_DUMP_SEGMENT: u8 = 0x1C;
    pub const HEAP_DUMP_END: u8 = 0x2C;
}

/// Heap dump sub-record tags
pub mod heap_tag {
    pub const ROOT_UNKNOWN: u8 = 0xFF;
    pub const ROOT_JNI_GLOBAL: u8 = 0x01;
    pub const ROOT_JNI_LOCAL: u8 = 0x02;
    pub const ROOT_JAVA_FRAME: u8 = 0x03;
    pub const ROOT_NATIVE_STACK: u8 = 0x04;
    pub const ROOT_STICKY_CLASS: u8 = 0x05;
    pub const ROOT_THREAD_BLOCK: u8 = 0x06;
    pub const ROOT_MONITOR_USED: u8 = 0x07;
    pub const ROOT_THREAD_OBJECT: u8 = 0x08;
    pub const CLASS_DUMP: u8 = 0x20;
    pub const INSTANCE_DUMP: u8 = 0x21;
    pub const OBJECT_ARRAY_DUMP: u8 = 0x22;
    pub const PRIMITIVE_ARRAY_DUMP: u8 = 0x23;
}

/// Field / array element type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BasicType {
    Object,
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

impl BasicType {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            2 => BasicType::Object,
            4 => BasicType::Boolean,
            5 => BasicType::Char,
            6 => BasicType::Float,
            7 => BasicType::Double,
            8 => BasicType::Byte,
            9 => BasicType::Short,
            10 => BasicType::Int,
            11 => BasicType::Long,
            _ => return None,
        })
    }

    pub(crate) fn parse(code: u8, offset: usize) -> Result<Self, SnapshotError> {
        Self::from_code(code)
            .ok_or_else(|| SnapshotError::format(offset, format!("invalid basic type {code}")))
    }

    /// Width in bytes; object references use the dump's identifier size
    pub fn size(&self, id_size: usize) -> usize {
        match self {
            BasicType::Object => id_size,
            BasicType::Boolean | BasicType::Byte => 1,
            BasicType::Char | BasicType::Short => 2,
            BasicType::Float | BasicType::Int => 4,
            BasicType::Double | BasicType::Long => 8,
        }
    }

    /// JVM class name of a primitive array with this element type
    pub fn array_class_name(&self) -> Option<&'static str> {
        Some(match self {
            BasicType::Object => return None,
            BasicType::Boolean => "[Z",
            BasicType::Char => "[C",
            BasicType::Float => "[F",
            BasicType::Double => "[D",
            BasicType::Byte => "[B",
            BasicType::Short => "[S",
            BasicType::Int => "[I",
            BasicType::Long => "[J",
        })
    }
}

/// What an object record says about its class, before resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRef {
    /// Instance or object array pointing at a class object id
    Class(u64),
    /// Primitive array; the class is implied by the element type
    PrimitiveArray(BasicType),
    /// A CLASS DUMP record; the object itself is a `java.lang.Class`
    ClassObject,
}

/// One object record as it appears in the dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub id: u64,
    pub class: ClassRef,
    /// Payload size; zero for class objects until resolution
    pub size: u64,
}

/// Per-class data from a CLASS DUMP sub-record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassDump {
    pub instance_size: u32,
}

/// Output of a single pass over the dump, class references still numeric
#[derive(Debug)]
pub struct ParsedDump {
    pub header: HprofHeader,
    /// UTF8 records: string id -> text
    pub strings: HashMap<u64, String>,
    /// LOAD CLASS records: class object id -> name string id
    pub loaded_classes: HashMap<u64, u64>,
    pub class_dumps: HashMap<u64, ClassDump>,
    /// Insertion order from the dump
    pub objects: Vec<RawObject>,
}
