/// Split interleaved samples into one buffer per channel.
pub fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut buffers: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(frames)).collect();
    for frame in samples.chunks_exact(channels) {
        for (buffer, &sample) in buffers.iter_mut().zip(frame) {
            buffer.push(sample);
        }
    }
    buffers
}

/// Inverse of [`deinterleave`]. Shorter channels are padded with silence.
pub fn interleave(buffers: &[Vec<f32>]) -> Vec<f32> {
    let frames = buffers.iter().map(Vec::len).max().unwrap_or(0);
    let channels = buffers.len();
    let mut out = vec![0.0; frames * channels];
    for (ch, buffer) in buffers.iter().enumerate() {
        for (i, &sample) in buffer.iter().enumerate() {
            out[i * channels + ch] = sample;
        }
    }
    out
}

/// Signed 16-bit PCM to float in -1..1.
pub fn pcm16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32_768.0).collect()
}
