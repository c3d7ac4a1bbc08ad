// ============================================================================
// HprofReader - 单遍线性扫描
// ============================================================================
//
// 顶层记录: u1 tag | u4 time | u4 length | body
// HEAP DUMP / HEAP DUMP SEGMENT 的 body 是一串子记录，子记录没有长度字段，
// 所以遇到未知子记录只能报错，不能跳过。
//
// ============================================================================

use std::collections::HashMap;

use tracing::debug;

use super::cursor::ByteCursor;
use super::header::HprofHeader;
use super::{heap_tag, tag, BasicType, ClassDump, ClassRef, ParsedDump, RawObject};
use crate::error::SnapshotError;

/// Record counters, logged once the pass completes
#[derive(Debug, Default, Clone, Copy)]
struct ReadStats {
    records: usize,
    skipped_records: usize,
    heap_segments: usize,
    roots: usize,
}

/// Reads a complete HPROF buffer into a [`ParsedDump`]
pub struct HprofReader<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> HprofReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(bytes),
        }
    }

    pub fn read(mut self) -> Result<ParsedDump, SnapshotError> {
        let header = HprofHeader::parse(&mut self.cursor)?;
        debug!(
            version = header.version.as_str(),
            id_size = header.id_size,
            "HPROF header parsed"
        );

        let mut dump = ParsedDump {
            header,
            strings: HashMap::new(),
            loaded_classes: HashMap::new(),
            class_dumps: HashMap::new(),
            objects: Vec::new(),
        };
        let mut stats = ReadStats::default();
        let id_size = dump.header.id_size;

        while !self.cursor.is_empty() {
            let record_offset = self.cursor.offset();
            let record_tag = self.cursor.u8()?;
            let _time = self.cursor.u32()?;
            let length = self.cursor.u32()? as usize;
            let body_offset = self.cursor.offset();
            let body = self.cursor.take(length)?;
            let mut body = ByteCursor::with_base(body, body_offset);
            stats.records += 1;

            match record_tag {
                tag::UTF8 => {
                    let id = body.id(id_size)?;
                    let text = String::from_utf8_lossy(body.rest()).into_owned();
                    dump.strings.insert(id, text);
                }
                tag::LOAD_CLASS => {
                    let _serial = body.u32()?;
                    let class_id = body.id(id_size)?;
                    let _stack_serial = body.u32()?;
                    let name_id = body.id(id_size)?;
                    dump.loaded_classes.insert(class_id, name_id);
                }
                tag::HEAP_DUMP | tag::HEAP_DUMP_SEGMENT => {
                    stats.heap_segments += 1;
                    read_heap_segment(&mut body, id_size, &mut dump, &mut stats)?;
                }
                tag::HEAP_DUMP_END => {}
                other => {
                    stats.skipped_records += 1;
                    debug!(tag = other, offset = record_offset, length, "skipping record");
                }
            }
        }

        debug!(
            records = stats.records,
            skipped = stats.skipped_records,
            heap_segments = stats.heap_segments,
            roots = stats.roots,
            strings = dump.strings.len(),
            classes = dump.loaded_classes.len(),
            objects = dump.objects.len(),
            "HPROF pass complete"
        );

        Ok(dump)
    }
}

fn read_heap_segment(
    body: &mut ByteCursor<'_>,
    id_size: usize,
    dump: &mut ParsedDump,
    stats: &mut ReadStats,
) -> Result<(), SnapshotError> {
    while !body.is_empty() {
        let sub_offset = body.offset();
        let sub_tag = body.u8()?;

        match sub_tag {
            heap_tag::ROOT_UNKNOWN | heap_tag::ROOT_STICKY_CLASS | heap_tag::ROOT_MONITOR_USED => {
                body.id(id_size)?;
                stats.roots += 1;
            }
            heap_tag::ROOT_JNI_GLOBAL => {
                body.id(id_size)?;
                body.id(id_size)?;
                stats.roots += 1;
            }
            heap_tag::ROOT_JNI_LOCAL | heap_tag::ROOT_JAVA_FRAME | heap_tag::ROOT_THREAD_OBJECT => {
                body.id(id_size)?;
                body.skip(8)?;
                stats.roots += 1;
            }
            heap_tag::ROOT_NATIVE_STACK | heap_tag::ROOT_THREAD_BLOCK => {
                body.id(id_size)?;
                body.skip(4)?;
                stats.roots += 1;
            }
            heap_tag::CLASS_DUMP => {
                let (class_id, class_dump) = read_class_dump(body, id_size)?;
                dump.class_dumps.insert(class_id, class_dump);
                dump.objects.push(RawObject {
                    id: class_id,
                    class: ClassRef::ClassObject,
                    size: 0,
                });
            }
            heap_tag::INSTANCE_DUMP => {
                let id = body.id(id_size)?;
                let _stack_serial = body.u32()?;
                let class_id = body.id(id_size)?;
                let byte_count = body.u32()?;
                body.skip(byte_count as usize)?;
                dump.objects.push(RawObject {
                    id,
                    class: ClassRef::Class(class_id),
                    size: u64::from(byte_count),
                });
            }
            heap_tag::OBJECT_ARRAY_DUMP => {
                let id = body.id(id_size)?;
                let _stack_serial = body.u32()?;
                let length = u64::from(body.u32()?);
                let class_id = body.id(id_size)?;
                body.skip_elements(length, id_size)?;
                dump.objects.push(RawObject {
                    id,
                    class: ClassRef::Class(class_id),
                    size: length * id_size as u64,
                });
            }
            heap_tag::PRIMITIVE_ARRAY_DUMP => {
                let id = body.id(id_size)?;
                let _stack_serial = body.u32()?;
                let length = u64::from(body.u32()?);
                let type_offset = body.offset();
                let element = BasicType::parse(body.u8()?, type_offset)?;
                if element == BasicType::Object {
                    return Err(SnapshotError::format(
                        type_offset,
                        "primitive array with object element type",
                    ));
                }
                let width = element.size(id_size);
                body.skip_elements(length, width)?;
                dump.objects.push(RawObject {
                    id,
                    class: ClassRef::PrimitiveArray(element),
                    size: length * width as u64,
                });
            }
            other => {
                return Err(SnapshotError::format(
                    sub_offset,
                    format!("unknown heap dump sub-record tag 0x{other:02x}"),
                ));
            }
        }
    }
    Ok(())
}

fn read_class_dump(
    body: &mut ByteCursor<'_>,
    id_size: usize,
) -> Result<(u64, ClassDump), SnapshotError> {
    let class_id = body.id(id_size)?;
    let _stack_serial = body.u32()?;
    // super, class loader, signers, protection domain, reserved x2
    for _ in 0..6 {
        body.id(id_size)?;
    }
    let instance_size = body.u32()?;

    let constant_pool = body.u16()?;
    for _ in 0..constant_pool {
        let _index = body.u16()?;
        let type_offset = body.offset();
        let ty = BasicType::parse(body.u8()?, type_offset)?;
        body.skip(ty.size(id_size))?;
    }

    let statics = body.u16()?;
    for _ in 0..statics {
        let _name = body.id(id_size)?;
        let type_offset = body.offset();
        let ty = BasicType::parse(body.u8()?, type_offset)?;
        body.skip(ty.size(id_size))?;
    }

    let instance_fields = body.u16()?;
    for _ in 0..instance_fields {
        let _name = body.id(id_size)?;
        let type_offset = body.offset();
        BasicType::parse(body.u8()?, type_offset)?;
    }

    Ok((class_id, ClassDump { instance_size }))
}
