// ============================================================================
// 测试辅助 - 合成 HPROF dump
// ============================================================================

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const REGION_SIZE: u64 = 2 * 1024 * 1024;
pub const ALLOC_SIZE: u64 = REGION_SIZE / 2 + 1700;
/// region_size - alloc_size: the largest size a filler can have
pub const FILLER_MAX: u64 = REGION_SIZE - ALLOC_SIZE;

pub const T_INT: u8 = 10;
pub const T_BYTE: u8 = 8;
pub const T_LONG: u8 = 11;

/// Minimal HPROF writer for fixtures
pub struct DumpBuilder {
    version: String,
    id_size: usize,
    records: Vec<u8>,
    segment: Vec<u8>,
    next_string_id: u64,
    next_serial: u32,
}

impl Default for DumpBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpBuilder {
    pub fn new() -> Self {
        Self {
            version: "1.0.2".to_string(),
            id_size: 8,
            records: Vec::new(),
            segment: Vec::new(),
            next_string_id: 0x5000_0000,
            next_serial: 1,
        }
    }

    pub fn id_size(mut self, id_size: usize) -> Self {
        self.id_size = id_size;
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    fn push_id(buf: &mut Vec<u8>, id_size: usize, id: u64) {
        match id_size {
            4 => buf.extend_from_slice(&(id as u32).to_be_bytes()),
            _ => buf.extend_from_slice(&id.to_be_bytes()),
        }
    }

    fn record(&mut self, tag: u8, body: &[u8]) {
        self.records.push(tag);
        self.records.extend_from_slice(&0u32.to_be_bytes());
        self.records.extend_from_slice(&(body.len() as u32).to_be_bytes());
        self.records.extend_from_slice(body);
    }

    /// Raw top-level record, e.g. a STACK TRACE the reader should skip
    pub fn raw_record(&mut self, tag: u8, body: &[u8]) -> &mut Self {
        self.flush_segment();
        self.record(tag, body);
        self
    }

    pub fn string(&mut self, id: u64, text: &str) -> &mut Self {
        self.flush_segment();
        let mut body = Vec::new();
        Self::push_id(&mut body, self.id_size, id);
        body.extend_from_slice(text.as_bytes());
        self.record(0x01, &body);
        self
    }

    /// UTF8 + LOAD CLASS for `name` (internal form, e.g. "java/lang/String")
    pub fn load_class(&mut self, class_id: u64, name: &str) -> &mut Self {
        let name_id = self.next_string_id;
        self.next_string_id += 1;
        self.string(name_id, name);
        self.load_class_with_name_id(class_id, name_id)
    }

    pub fn load_class_with_name_id(&mut self, class_id: u64, name_id: u64) -> &mut Self {
        self.flush_segment();
        let mut body = Vec::new();
        body.extend_from_slice(&self.next_serial.to_be_bytes());
        self.next_serial += 1;
        Self::push_id(&mut body, self.id_size, class_id);
        body.extend_from_slice(&0u32.to_be_bytes());
        Self::push_id(&mut body, self.id_size, name_id);
        self.record(0x02, &body);
        self
    }

    /// CLASS DUMP with one int static and one object instance field
    pub fn class_dump(&mut self, class_id: u64, super_id: u64, instance_size: u32) -> &mut Self {
        let id = self.id_size;
        let seg = &mut self.segment;
        seg.push(0x20);
        Self::push_id(seg, id, class_id);
        seg.extend_from_slice(&0u32.to_be_bytes());
        Self::push_id(seg, id, super_id);
        for _ in 0..5 {
            Self::push_id(seg, id, 0);
        }
        seg.extend_from_slice(&instance_size.to_be_bytes());
        // constant pool: one long
        seg.extend_from_slice(&1u16.to_be_bytes());
        seg.extend_from_slice(&3u16.to_be_bytes());
        seg.push(T_LONG);
        seg.extend_from_slice(&42u64.to_be_bytes());
        // statics: one int
        seg.extend_from_slice(&1u16.to_be_bytes());
        Self::push_id(seg, id, 0x7000);
        seg.push(T_INT);
        seg.extend_from_slice(&7u32.to_be_bytes());
        // instance fields: one reference
        seg.extend_from_slice(&1u16.to_be_bytes());
        Self::push_id(seg, id, 0x7001);
        seg.push(2);
        self
    }

    pub fn instance(&mut self, obj_id: u64, class_id: u64, byte_count: u32) -> &mut Self {
        let id = self.id_size;
        let seg = &mut self.segment;
        seg.push(0x21);
        Self::push_id(seg, id, obj_id);
        seg.extend_from_slice(&0u32.to_be_bytes());
        Self::push_id(seg, id, class_id);
        seg.extend_from_slice(&byte_count.to_be_bytes());
        seg.extend(std::iter::repeat(0u8).take(byte_count as usize));
        self
    }

    pub fn object_array(&mut self, obj_id: u64, class_id: u64, length: u32) -> &mut Self {
        let id = self.id_size;
        let seg = &mut self.segment;
        seg.push(0x22);
        Self::push_id(seg, id, obj_id);
        seg.extend_from_slice(&0u32.to_be_bytes());
        seg.extend_from_slice(&length.to_be_bytes());
        Self::push_id(seg, id, class_id);
        for _ in 0..length {
            Self::push_id(seg, id, 0);
        }
        self
    }

    pub fn primitive_array(&mut self, obj_id: u64, type_code: u8, width: usize, length: u32) -> &mut Self {
        let id = self.id_size;
        let seg = &mut self.segment;
        seg.push(0x23);
        Self::push_id(seg, id, obj_id);
        seg.extend_from_slice(&0u32.to_be_bytes());
        seg.extend_from_slice(&length.to_be_bytes());
        seg.push(type_code);
        seg.extend(std::iter::repeat(0u8).take(length as usize * width));
        self
    }

    /// `int[]` whose payload is exactly `bytes` long (multiple of 4)
    pub fn int_array_of_size(&mut self, obj_id: u64, bytes: u64) -> &mut Self {
        assert_eq!(bytes % 4, 0, "int[] payload must be a multiple of 4");
        self.primitive_array(obj_id, T_INT, 4, (bytes / 4) as u32)
    }

    pub fn byte_array(&mut self, obj_id: u64, length: u32) -> &mut Self {
        self.primitive_array(obj_id, T_BYTE, 1, length)
    }

    pub fn root_unknown(&mut self, obj_id: u64) -> &mut Self {
        let id = self.id_size;
        self.segment.push(0xFF);
        Self::push_id(&mut self.segment, id, obj_id);
        self
    }

    pub fn root_thread_object(&mut self, obj_id: u64) -> &mut Self {
        let id = self.id_size;
        self.segment.push(0x08);
        Self::push_id(&mut self.segment, id, obj_id);
        self.segment.extend_from_slice(&[0; 8]);
        self
    }

    /// Close the current HEAP DUMP SEGMENT; later sub-records start a new one
    pub fn flush_segment(&mut self) -> &mut Self {
        if !self.segment.is_empty() {
            let segment = std::mem::take(&mut self.segment);
            self.record(0x1C, &segment);
        }
        self
    }

    pub fn build(&mut self) -> Vec<u8> {
        self.flush_segment();
        self.record(0x2C, &[]);

        let mut out = Vec::new();
        out.extend_from_slice(b"JAVA PROFILE ");
        out.extend_from_slice(self.version.as_bytes());
        out.push(0);
        out.extend_from_slice(&(self.id_size as u32).to_be_bytes());
        out.extend_from_slice(&1_700_000_000_000u64.to_be_bytes());
        out.extend_from_slice(&self.records);
        out
    }
}

pub fn write_dump(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture dump");
    path
}

/// What the producing JVM leaves behind: ten humongous byte arrays plus some
/// ordinary objects. When `with_fillers` is set, each byte array is followed by
/// the int[] G1 used to pad the rest of its region.
pub fn humongous_dump(with_fillers: bool) -> DumpBuilder {
    let mut b = DumpBuilder::new();
    b.load_class(0x100, "java/lang/String");
    b.load_class(0x101, "[Ljava/lang/Object;");
    b.root_unknown(0x9000);

    for i in 0..10u64 {
        b.byte_array(0x1000 + i, ALLOC_SIZE as u32);
        if with_fillers {
            // filler 头部 16 字节不计入 payload
            b.int_array_of_size(0x2000 + i, FILLER_MAX - 16);
        }
    }
    b.instance(0x3000, 0x100, 24);
    b.object_array(0x3001, 0x101, 10);
    b.int_array_of_size(0x3002, 64);
    b
}
