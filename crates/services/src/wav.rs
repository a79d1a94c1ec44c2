// Copyright (c) 2024 Mike Tsao

//! WAV reading and writing, courtesy of [hound].

use anyhow::{anyhow, Context};
use cadenza::{
    audio::{QuantizedBuffer, SampleBuffer},
    types::SampleRate,
    util::RenderSettings,
    Signal,
};
use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek, Write},
    path::Path,
};

/// Decodes WAV data into a buffer of floats in [-1.0, 1.0], one vector per
/// channel. Integer samples are divided by `2^(bits - 1)`; float samples pass
/// through unchanged.
pub fn decode<R: Read>(reader: R) -> anyhow::Result<SampleBuffer> {
    let mut reader = hound::WavReader::new(reader)?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    if num_channels == 0 {
        return Err(anyhow!("WAV data declares zero channels"));
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 2.0f64.powi(spec.bits_per_sample as i32 - 1);
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f64 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / num_channels;
    let mut channels = vec![Vec::with_capacity(frames); num_channels];
    for (i, s) in interleaved.into_iter().take(frames * num_channels).enumerate() {
        channels[i % num_channels].push(s);
    }
    Ok(SampleBuffer::from_channels(
        channels,
        SampleRate(spec.sample_rate as usize),
    )?)
}

/// Reads and decodes a WAV file.
pub fn decode_file(path: impl AsRef<Path>) -> anyhow::Result<SampleBuffer> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    decode(BufReader::new(file)).with_context(|| format!("decoding {}", path.display()))
}

fn spec_for(quantized: &QuantizedBuffer) -> anyhow::Result<hound::WavSpec> {
    Ok(hound::WavSpec {
        channels: u16::try_from(quantized.num_channels())
            .map_err(|_| anyhow!("{} channels is too many", quantized.num_channels()))?,
        sample_rate: quantized.sample_rate().into(),
        bits_per_sample: quantized.byte_width().bits(),
        sample_format: hound::SampleFormat::Int,
    })
}

fn write_samples<W: Write + Seek>(
    mut writer: hound::WavWriter<W>,
    quantized: &QuantizedBuffer,
) -> anyhow::Result<()> {
    for s in quantized.samples() {
        writer.write_sample(*s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encodes quantized audio as a complete WAV file in memory.
pub fn encode(quantized: &QuantizedBuffer) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::default();
    let writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec_for(quantized)?)?;
    write_samples(writer, quantized)?;
    Ok(bytes)
}

/// Renders `signal` as `settings` describe and writes it to a WAV file.
pub fn export_wav(
    signal: &Signal,
    settings: &RenderSettings,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let quantized = signal.render(settings)?;
    let writer = hound::WavWriter::create(path, spec_for(&quantized)?)
        .with_context(|| format!("creating {}", path.display()))?;
    write_samples(writer, &quantized)?;
    log::debug!(
        "wrote {} frames to {}",
        quantized.frames(),
        path.display()
    );
    Ok(())
}
