//! Writes a small tree in both encodings with byte tracing enabled, then
//! reads it back.
//!
//! Run with `RUST_LOG=trace` to see every chunk crossing the stream.

use chrono::{DateTime, TimeDelta};
use tagwire::{
    ObjectReader, ObjectReaderExt, ObjectWriter, ObjectWriterExt, ReadLimits, TextOptions,
    TracingObserver, WireFormat,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn write_sample(writer: &mut dyn ObjectWriter) -> tagwire::Result<()> {
    writer.write_start_object()?;
    writer.write_member(1)?;
    writer.write_str("sensor-7")?;
    writer.write_member(2)?;
    writer.write_guid(&Uuid::from_u128(0x6f9619ff_8b86_d011_b42d_00c04fc964ff))?;
    writer.write_member(3)?;
    writer.write_start_array()?;
    for reading in [20.5, 21.0, -3.25] {
        writer.write_f64(reading)?;
    }
    writer.write_end_array()?;
    writer.write_member(4)?;
    writer.write_time_span(TimeDelta::milliseconds(1500))?;
    writer.write_member(5)?;
    let taken = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    writer.write_date_time(&taken)?;
    writer.write_member(99)?;
    writer.write_nullable_bytes(Some(b"unknown to readers"))?;
    writer.write_end_object()?;
    writer.flush()
}

fn read_sample(reader: &mut dyn ObjectReader) -> tagwire::Result<()> {
    let Some(mut members) = reader.get_object()? else {
        println!("  (null)");
        return Ok(());
    };
    while let Some(mut member) = members.next()? {
        match member.key() {
            1 => println!("  name     = {:?}", member.read_value_as_string(64)?),
            2 => println!("  id       = {}", member.read_value_as_guid()?),
            3 => println!("  readings = {:?}", member.read_value_as_f64_list()?),
            4 => println!("  interval = {}", member.read_value_as_time_span()?),
            5 => println!("  taken    = {}", member.read_value_as_date_time()?),
            key => println!("  member {key} skipped"),
        }
    }
    Ok(())
}

fn main() -> tagwire::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    for format in [WireFormat::Binary, WireFormat::Text(TextOptions::pretty())] {
        let mut buf = Vec::new();
        {
            let mut writer = format.writer_with_observer(&mut buf, Box::new(TracingObserver));
            write_sample(writer.as_mut())?;
        }
        println!("{} ({} bytes)", format.name(), buf.len());
        if let WireFormat::Text(_) = format {
            println!("{}", String::from_utf8_lossy(&buf));
        }

        let mut reader =
            format.reader_with_observer(buf.as_slice(), ReadLimits::default(), Box::new(TracingObserver));
        read_sample(reader.as_mut())?;
    }
    Ok(())
}
