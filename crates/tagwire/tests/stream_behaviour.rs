//! Stream-level behaviour shared by both encodings: grammar enforcement,
//! quotas, observation, escaping and cursor positioning.

use std::cell::RefCell;
use std::rc::Rc;

use tagwire::{
    BinaryObjectWriter, ContainerKind, Error, ErrorKind, ObjectReader, ObjectReaderExt,
    ObjectWriter, Observer, ReadLimits, TextObjectReader, TextObjectWriter, TextOptions,
    WireFormat,
};

fn formats() -> [WireFormat; 2] {
    [WireFormat::Binary, WireFormat::Text(TextOptions::new())]
}

fn encode(format: WireFormat, write: impl FnOnce(&mut dyn ObjectWriter)) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = format.writer(&mut buf);
        write(writer.as_mut());
        writer.flush().unwrap();
    }
    buf
}

#[derive(Clone, Default)]
struct Recorder {
    written: Rc<RefCell<Vec<u8>>>,
    read: Rc<RefCell<Vec<u8>>>,
}

impl Observer for Recorder {
    fn on_write(&mut self, bytes: &[u8]) {
        self.written.borrow_mut().extend_from_slice(bytes);
    }

    fn on_read(&mut self, bytes: &[u8]) {
        self.read.borrow_mut().extend_from_slice(bytes);
    }
}

#[test]
fn test_binary_wire_layout() {
    let mut writer = BinaryObjectWriter::new(Vec::new());
    writer.write_start_object().unwrap();
    writer.write_member(1).unwrap();
    writer.write_bool(true).unwrap();
    writer.write_member(200).unwrap();
    writer.write_null().unwrap();
    writer.write_end_object().unwrap();
    assert_eq!(
        writer.into_inner(),
        vec![0x40, 0x01, 0x45, 0x81, 0x48, 0x44, 0x41]
    );
}

#[test]
fn test_write_grammar_violations() {
    for format in formats() {
        let mut buf = Vec::new();
        let mut writer = format.writer(&mut buf);

        assert!(matches!(
            writer.write_i32(1),
            Err(Error::NoOpenContainer { .. })
        ));
        assert!(matches!(
            writer.write_end_array(),
            Err(Error::NoOpenContainer { .. })
        ));

        writer.write_start_object().unwrap();
        assert!(matches!(
            writer.write_bool(true),
            Err(Error::InvalidPosition { .. })
        ));
        let err = writer.write_member(0).unwrap_err();
        assert!(matches!(err, Error::InvalidMemberKey { key: 0 }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(matches!(
            writer.write_end_array(),
            Err(Error::ContainerMismatch {
                expected: ContainerKind::Array,
                found: ContainerKind::Object,
                ..
            })
        ));

        writer.write_member(1).unwrap();
        assert!(matches!(
            writer.write_member(2),
            Err(Error::InvalidPosition { .. })
        ));
        assert!(matches!(
            writer.write_end_object(),
            Err(Error::InvalidPosition { .. })
        ));
        writer.write_null().unwrap();
        writer.write_end_object().unwrap();
        assert_eq!(writer.depth(), 0, "{}", format.name());
    }
}

#[test]
fn test_read_cursor_misuse() {
    for format in formats() {
        let bytes = encode(format, |w| {
            w.write_start_array().unwrap();
            w.write_i32(1).unwrap();
            w.write_end_array().unwrap();
        });
        let mut reader = format.reader(bytes.as_slice(), ReadLimits::default());
        assert!(matches!(
            reader.move_to_next_member(),
            Err(Error::NoOpenContainer { .. })
        ));
        assert!(matches!(
            reader.read_value_as_i32(),
            Err(Error::InvalidPosition { .. })
        ));
        reader.read_start_array().unwrap();
        assert!(matches!(
            reader.read_value_as_i32(),
            Err(Error::InvalidPosition { .. })
        ));
        assert!(matches!(
            reader.move_to_next_member(),
            Err(Error::ContainerMismatch { .. })
        ));
    }
}

#[test]
fn test_string_and_bytes_quota() {
    for format in formats() {
        let bytes = encode(format, |w| {
            w.write_start_array().unwrap();
            w.write_str("abcd").unwrap();
            w.write_bytes(&[9; 6]).unwrap();
            w.write_end_array().unwrap();
        });

        let mut reader = format.reader(bytes.as_slice(), ReadLimits::default());
        reader.read_start_array().unwrap();
        reader.move_to_next_array_value().unwrap();
        assert_eq!(reader.read_value_as_string(4).unwrap().as_deref(), Some("abcd"));
        reader.move_to_next_array_value().unwrap();
        assert_eq!(reader.read_value_as_bytes(6).unwrap(), Some(vec![9; 6]));
        reader.read_end_array().unwrap();

        let mut reader = format.reader(bytes.as_slice(), ReadLimits::default());
        reader.read_start_array().unwrap();
        reader.move_to_next_array_value().unwrap();
        let err = reader.read_value_as_string(3).unwrap_err();
        assert!(
            matches!(err, Error::QuotaExceeded { field: "string", quota: 3, .. }),
            "{}: {err}",
            format.name()
        );
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);

        let mut reader = format.reader(bytes.as_slice(), ReadLimits::default());
        reader.read_start_array().unwrap();
        reader.move_to_next_array_value().unwrap();
        reader.move_to_next_array_value().unwrap();
        assert!(matches!(
            reader.read_value_as_bytes(5),
            Err(Error::QuotaExceeded { field: "bytes", quota: 5, .. })
        ));
    }
}

#[test]
fn test_array_length_limit() {
    for format in formats() {
        let bytes = encode(format, |w| {
            w.write_start_array().unwrap();
            for value in [1u32, 2, 3] {
                w.write_u32(value).unwrap();
            }
            w.write_end_array().unwrap();
        });

        let limits = ReadLimits::new().with_max_array_len(3);
        let mut reader = format.reader(bytes.as_slice(), limits);
        assert_eq!(reader.read_value_as_u32_list().unwrap(), Some(vec![1, 2, 3]));

        let limits = ReadLimits::new().with_max_array_len(2);
        let mut reader = format.reader(bytes.as_slice(), limits);
        assert!(matches!(
            reader.read_value_as_u32_list(),
            Err(Error::QuotaExceeded { field: "array", len: 3, quota: 2 })
        ));
    }
}

#[test]
fn test_observer_sees_exact_bytes() {
    for format in formats() {
        let recorder = Recorder::default();
        let mut buf = Vec::new();
        {
            let mut writer = format.writer_with_observer(&mut buf, Box::new(recorder.clone()));
            writer.write_start_object().unwrap();
            writer.write_member(4).unwrap();
            writer.write_str("observed").unwrap();
            writer.write_member(5).unwrap();
            writer.write_f32(2.5).unwrap();
            writer.write_end_object().unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(*recorder.written.borrow(), buf, "{}", format.name());

        let mut reader =
            format.reader_with_observer(buf.as_slice(), ReadLimits::default(), Box::new(recorder.clone()));
        let mut members = reader.get_object().unwrap().unwrap();
        while let Some(mut member) = members.next().unwrap() {
            if member.key() == 5 {
                assert_eq!(member.read_value_as_f32().unwrap(), 2.5);
            }
        }
        drop(members);
        assert_eq!(*recorder.read.borrow(), buf, "{}", format.name());
    }
}

#[test]
fn test_text_escaping() {
    let mut writer = TextObjectWriter::new(Vec::new(), TextOptions::new());
    writer.write_start_array().unwrap();
    writer.write_str("a\"b\\c").unwrap();
    writer.write_str("bell\u{7}\ttab").unwrap();
    writer.write_str("caf\u{e9}").unwrap();
    writer.write_end_array().unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(text, "[\"a\\\"b\\\\c\",\"bell\\u0007\\ttab\",\"caf\u{e9}\"]");

    let mut reader = TextObjectReader::new(text.as_bytes());
    let values = reader.read_value_as_string_list(64).unwrap().unwrap();
    assert_eq!(
        values,
        vec![
            Some("a\"b\\c".to_string()),
            Some("bell\u{7}\ttab".to_string()),
            Some("caf\u{e9}".to_string()),
        ]
    );

    let mut reader = TextObjectReader::new(r#"["A\/\n😀",null]"#.as_bytes());
    let values = reader.read_value_as_string_list(64).unwrap().unwrap();
    assert_eq!(values, vec![Some("A/\n\u{1f600}".to_string()), None]);
}

#[test]
fn test_text_accepts_whitespace_and_member_newlines() {
    let text = "\r\n{\r\n\"2\" : [ 1 ,2 ] ,\n\t\"1\":\"x\" }  ";
    let mut reader = TextObjectReader::new(text.as_bytes());
    let mut members = reader.get_object().unwrap().unwrap();
    let mut seen = Vec::new();
    while let Some(mut member) = members.next().unwrap() {
        match member.key() {
            2 => seen.push(format!("{:?}", member.read_value_as_i64_list().unwrap())),
            1 => seen.push(format!("{:?}", member.read_value_as_string(8).unwrap())),
            _ => unreachable!(),
        }
    }
    assert_eq!(seen, vec!["Some([1, 2])", "Some(\"x\")"]);
}

#[test]
fn test_members_leave_reader_after_object() {
    for format in formats() {
        let bytes = encode(format, |w| {
            w.write_start_array().unwrap();
            for id in [10, 20] {
                w.write_start_object().unwrap();
                w.write_member(1).unwrap();
                w.write_i32(id).unwrap();
                w.write_member(2).unwrap();
                w.write_str("ignored").unwrap();
                w.write_end_object().unwrap();
            }
            w.write_end_array().unwrap();
        });

        let mut reader = format.reader(bytes.as_slice(), ReadLimits::default());
        let mut ids = Vec::new();
        let mut values = reader.get_array_values(|r| {
            let mut id = None;
            let mut members = r.get_object()?.expect("element is an object");
            while let Some(mut member) = members.next()? {
                if member.key() == 1 {
                    id = Some(member.read_value_as_i32()?);
                }
            }
            Ok(id)
        })
        .unwrap()
        .unwrap();
        for id in values.by_ref() {
            ids.push(id.unwrap());
        }
        assert!(values.next().is_none());
        drop(values);
        assert_eq!(ids, vec![Some(10), Some(20)]);
        assert_eq!(reader.depth(), 0, "{}", format.name());
    }
}

#[test]
fn test_unknown_nested_members_skipped() {
    for format in formats() {
        let bytes = encode(format, |w| {
            w.write_start_object().unwrap();
            w.write_member(77).unwrap();
            w.write_start_object().unwrap();
            w.write_member(1).unwrap();
            w.write_start_array().unwrap();
            w.write_start_array().unwrap();
            w.write_str("]}").unwrap();
            w.write_end_array().unwrap();
            w.write_bytes(&[0x40, 0x41, 0x42]).unwrap();
            w.write_null().unwrap();
            w.write_end_array().unwrap();
            w.write_member(2).unwrap();
            w.write_f64(f64::NEG_INFINITY).unwrap();
            w.write_end_object().unwrap();
            w.write_member(2).unwrap();
            w.write_i64(-9).unwrap();
            w.write_end_object().unwrap();
        });

        let mut reader = format.reader(bytes.as_slice(), ReadLimits::default());
        let mut found = None;
        let mut members = reader.get_object().unwrap().unwrap();
        while let Some(mut member) = members.next().unwrap() {
            if member.key() == 2 {
                found = Some(member.read_value_as_i64().unwrap());
            }
        }
        drop(members);
        assert_eq!(found, Some(-9), "{}", format.name());
    }
}

#[test]
fn test_nesting_limit() {
    for format in formats() {
        let bytes = encode(format, |w| {
            for _ in 0..4 {
                w.write_start_array().unwrap();
            }
            for _ in 0..4 {
                w.write_end_array().unwrap();
            }
        });

        let mut reader = format.reader(bytes.as_slice(), ReadLimits::new().with_max_depth(3));
        reader.read_start_array().unwrap();
        reader.move_to_next_array_value().unwrap();
        reader.read_start_array().unwrap();
        reader.move_to_next_array_value().unwrap();
        reader.read_start_array().unwrap();
        reader.move_to_next_array_value().unwrap();
        assert!(matches!(
            reader.read_start_array(),
            Err(Error::NestingTooDeep { max: 3 })
        ));

        let mut reader = format.reader(bytes.as_slice(), ReadLimits::new().with_max_depth(2));
        reader.read_start_array().unwrap();
        reader.move_to_next_array_value().unwrap();
        assert!(matches!(
            reader.skip_value(),
            Err(Error::NestingTooDeep { max: 2 })
        ));

        let mut reader = format.reader(bytes.as_slice(), ReadLimits::unlimited());
        reader.skip_value().unwrap();
        assert_eq!(reader.depth(), 0);
    }
}

#[test]
fn test_truncated_input() {
    for format in formats() {
        let bytes = encode(format, |w| {
            w.write_start_object().unwrap();
            w.write_member(1).unwrap();
            w.write_str("truncated").unwrap();
            w.write_end_object().unwrap();
        });
        let cut = &bytes[..bytes.len() - 3];
        let mut reader = format.reader(cut, ReadLimits::default());
        let err = reader.read_value_as_string_list(64).unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }), "{err}");

        let mut reader = format.reader(cut, ReadLimits::default());
        let mut members = reader.get_object().unwrap().unwrap();
        let mut member = members.next().unwrap().unwrap();
        let err = member.read_value_as_string(64).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }), "{}: {err}", format.name());
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}

#[test]
fn test_malformed_unknown_member_rejected() {
    for unknown in ["[1,,,2 3]", r#"{"x" 1 "y"}"#, "{::,}", "[\"raw\ttab\"]", "[1e400x]"] {
        let text = format!(r#"{{"1":{unknown},"2":5}}"#);
        let mut reader = TextObjectReader::new(text.as_bytes());
        let mut members = reader.get_object().unwrap().unwrap();
        // member 1 is unknown to the caller and gets skipped
        let skipped = members.next().and_then(|first| match first {
            Some(first) => {
                assert_eq!(first.key(), 1);
                Ok(())
            }
            None => panic!("member 1 missing"),
        });
        let skipped = skipped.and_then(|()| members.next().map(|_| ()));
        assert!(skipped.is_err(), "{text} was accepted");
    }
}
