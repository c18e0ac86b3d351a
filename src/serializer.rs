// File: src/serializer.rs
//
// Deterministic binary encoding for a compiled Chunk (spec §4.3):
// magic "IZB\0", version 1, then code/constants/names.

use std::rc::Rc;

use crate::bytecode::Chunk;
use crate::callable::UserFunction;
use crate::errors::IziError;
use crate::value::Value;

const MAGIC: &[u8; 4] = b"IZB\0";
const VERSION: u32 = 1;

pub fn serialize_chunk(chunk: &Chunk) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    write_body(chunk, &mut out);
    out
}

fn write_body(chunk: &Chunk, out: &mut Vec<u8>) {
    out.extend_from_slice(&(chunk.code.len() as u32).to_le_bytes());
    out.extend_from_slice(&chunk.code);

    out.extend_from_slice(&(chunk.constants.len() as u32).to_le_bytes());
    for c in &chunk.constants {
        write_value(c, out);
    }

    out.extend_from_slice(&(chunk.names.len() as u32).to_le_bytes());
    for n in &chunk.names {
        write_string(n, out);
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Nil => out.push(0),
        Value::Bool(b) => {
            out.push(1);
            out.push(if *b { 1 } else { 0 });
        }
        Value::Number(n) => {
            out.push(2);
            out.extend_from_slice(&n.to_le_bytes());
        }
        Value::String(s) => {
            out.push(3);
            write_string(s, out);
        }
        Value::Array(a) => {
            out.push(4);
            let borrowed = a.borrow();
            out.extend_from_slice(&(borrowed.elements.len() as u32).to_le_bytes());
            for v in &borrowed.elements {
                write_value(v, out);
            }
        }
        Value::Map(m) => {
            out.push(5);
            let borrowed = m.borrow();
            out.extend_from_slice(&(borrowed.entries.len() as u32).to_le_bytes());
            for (k, v) in &borrowed.entries {
                write_string(k, out);
                write_value(v, out);
            }
        }
        Value::Set(s) => {
            out.push(6);
            let borrowed = s.borrow();
            out.extend_from_slice(&(borrowed.entries.len() as u32).to_le_bytes());
            for (k, v) in &borrowed.entries {
                write_string(k, out);
                write_value(v, out);
            }
        }
        Value::Callable(c) => {
            if let Some(f) = c.as_user_function() {
                out.push(7);
                write_string(&f.name, out);
                out.extend_from_slice(&(f.params.len() as u32).to_le_bytes());
                for p in &f.params {
                    write_string(p, out);
                }
                write_body(&f.chunk, out);
            } else {
                out.push(8);
                write_string(c.name(), out);
            }
        }
        Value::Class(class) => {
            out.push(9);
            write_string(&class.name, out);
            out.extend_from_slice(&(class.field_names.len() as u32).to_le_bytes());
            for name in &class.field_names {
                write_string(name, out);
            }
            out.extend_from_slice(&(class.field_defaults.len() as u32).to_le_bytes());
            for (k, v) in &class.field_defaults {
                write_string(k, out);
                write_value(v, out);
            }
            out.extend_from_slice(&(class.methods.len() as u32).to_le_bytes());
            for (k, m) in &class.methods {
                write_string(k, out);
                write_value(&Value::Callable(m.clone()), out);
            }
        }
        Value::Instance(_) => {
            // Never serialized; the caller of `serialize_chunk` must
            // not have produced a constant pool containing one.
            out.push(10);
        }
        Value::Error(e) => {
            out.push(11);
            write_string(&e.message, out);
            write_string(&e.type_name, out);
        }
    }
}

pub fn deserialize_chunk(bytes: &[u8]) -> Result<Chunk, IziError> {
    let mut r = Reader { bytes, pos: 0 };
    let magic = r.take(4)?;
    if magic != MAGIC {
        return Err(IziError::new(
            crate::errors::ErrorKind::SerializerError,
            "bad magic: not an IZB chunk file",
        ));
    }
    let version = r.u32()?;
    if version != VERSION {
        return Err(IziError::new(
            crate::errors::ErrorKind::SerializerError,
            format!("unsupported chunk version {}", version),
        ));
    }
    read_body(&mut r)
}

fn read_body(r: &mut Reader) -> Result<Chunk, IziError> {
    let code_len = r.u32()? as usize;
    let code = r.take(code_len)?.to_vec();

    let const_n = r.u32()?;
    let mut constants = Vec::with_capacity(const_n as usize);
    for _ in 0..const_n {
        constants.push(read_value(r)?);
    }

    let name_n = r.u32()?;
    let mut names = Vec::with_capacity(name_n as usize);
    for _ in 0..name_n {
        names.push(r.string()?);
    }

    Ok(Chunk { code, constants, names, lines: Vec::new() })
}

fn read_value(r: &mut Reader) -> Result<Value, IziError> {
    let tag = r.byte()?;
    match tag {
        0 => Ok(Value::Nil),
        1 => Ok(Value::Bool(r.byte()? != 0)),
        2 => Ok(Value::Number(f64::from_le_bytes(r.take(8)?.try_into().unwrap()))),
        3 => Ok(Value::string(r.string()?)),
        4 => {
            let n = r.u32()?;
            let mut elements = Vec::with_capacity(n as usize);
            for _ in 0..n {
                elements.push(read_value(r)?);
            }
            Ok(Value::array(elements))
        }
        5 | 6 => {
            let n = r.u32()?;
            let mut entries = crate::value::AHashMap::default();
            for _ in 0..n {
                let k = r.string()?;
                let v = read_value(r)?;
                entries.insert(k, v);
            }
            if tag == 5 {
                Ok(Value::map(entries))
            } else {
                Ok(Value::Set(Rc::new(std::cell::RefCell::new(crate::value::Set { entries }))))
            }
        }
        7 => {
            let name = r.string()?;
            let param_count = r.u32()?;
            let mut params = Vec::with_capacity(param_count as usize);
            for _ in 0..param_count {
                params.push(r.string()?);
            }
            let chunk = read_body(r)?;
            Ok(Value::Callable(Rc::new(UserFunction::new(name, params, Rc::new(chunk)))))
        }
        8 => Err(IziError::new(
            crate::errors::ErrorKind::SerializerError,
            "native functions must be registered at runtime",
        )),
        9 => {
            let name = r.string()?;
            let field_n = r.u32()?;
            let mut field_names = Vec::with_capacity(field_n as usize);
            for _ in 0..field_n {
                field_names.push(r.string()?);
            }
            let default_n = r.u32()?;
            let mut field_defaults = crate::value::AHashMap::default();
            for _ in 0..default_n {
                let k = r.string()?;
                field_defaults.insert(k, read_value(r)?);
            }
            let method_n = r.u32()?;
            let mut methods = crate::value::AHashMap::default();
            for _ in 0..method_n {
                let k = r.string()?;
                if let Value::Callable(c) = read_value(r)? {
                    methods.insert(k, c);
                }
            }
            Ok(Value::Class(Rc::new(crate::value::Class {
                name,
                methods,
                field_names,
                field_defaults,
                superclass: None,
            })))
        }
        10 => Err(IziError::new(
            crate::errors::ErrorKind::SerializerError,
            "cannot deserialize an Instance value",
        )),
        11 => {
            let message = r.string()?;
            let type_name = r.string()?;
            Ok(Value::error(message, type_name))
        }
        other => Err(IziError::new(
            crate::errors::ErrorKind::SerializerError,
            format!("unknown value tag {}", other),
        )),
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], IziError> {
        if self.pos + n > self.bytes.len() {
            return Err(IziError::new(
                crate::errors::ErrorKind::SerializerError,
                "truncated chunk file",
            ));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, IziError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, IziError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn string(&mut self) -> Result<String, IziError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            IziError::new(crate::errors::ErrorKind::SerializerError, "invalid UTF-8 in chunk string")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_round_trip_byte_identically() {
        let mut chunk = Chunk::new();
        chunk.add_constant(Value::Number(5.0)).unwrap();
        chunk.add_constant(Value::Bool(true)).unwrap();
        chunk.add_constant(Value::string("hi")).unwrap();
        chunk.add_constant(Value::Nil).unwrap();
        chunk.write(0, 1);
        let bytes = serialize_chunk(&chunk);
        assert_eq!(&bytes[0..4], b"IZB\0");
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        let back = deserialize_chunk(&bytes).unwrap();
        assert_eq!(back.constants.len(), 4);
        assert_eq!(back.code, chunk.code);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let err = deserialize_chunk(b"NOPE....").unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::SerializerError);
    }
}
