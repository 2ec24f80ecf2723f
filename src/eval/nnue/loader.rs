use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::error::NetworkError;

use super::features::INPUTS;
use super::network::{Network, HIDDEN};

const MAGIC: &[u8; 8] = b"DHNNUE01";

// Format (all little endian):
// magic: 8 bytes b"DHNNUE01"
// u32 input_dim, u32 hidden_dim
// i16 feature_weights[input_dim * hidden_dim]  (row per input)
// i16 feature_bias[hidden_dim]
// i16 our_weights[hidden_dim], i16 their_weights[hidden_dim]
// i32 output_bias, i32 scale

pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
    let f = File::open(&path).with_context(|| format!("open network file: {}", path.as_ref().display()))?;
    read_network(&mut BufReader::new(f)).with_context(|| format!("read network file: {}", path.as_ref().display()))
}

pub fn save<P: AsRef<Path>>(net: &Network, path: P) -> Result<()> {
    let f = File::create(&path).with_context(|| format!("create network file: {}", path.as_ref().display()))?;
    let mut w = BufWriter::new(f);
    w.write_all(MAGIC)?;
    w.write_all(&(INPUTS as u32).to_le_bytes())?;
    w.write_all(&(HIDDEN as u32).to_le_bytes())?;
    for v in net
        .feature_weights
        .iter()
        .chain(net.feature_bias.iter())
        .chain(net.our_weights.iter())
        .chain(net.their_weights.iter())
    {
        w.write_all(&v.to_le_bytes())?;
    }
    w.write_all(&net.output_bias.to_le_bytes())?;
    w.write_all(&net.scale.to_le_bytes())?;
    w.flush().context("flush network file")?;
    Ok(())
}

pub fn read_network<R: Read>(r: &mut R) -> Result<Network> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic).context("read magic")?;
    if &magic != MAGIC {
        bail!(NetworkError::BadMagic);
    }
    let inputs = read_u32(r).context("read input_dim")? as usize;
    let hidden = read_u32(r).context("read hidden_dim")? as usize;
    if inputs != INPUTS {
        bail!("network input size {inputs} does not match {INPUTS}");
    }
    if hidden != HIDDEN {
        bail!(NetworkError::HiddenSize { expected: HIDDEN, found: hidden });
    }

    let feature_weights = read_i16s(r, INPUTS * HIDDEN).context("read feature weights")?;
    let mut feature_bias = [0i16; HIDDEN];
    feature_bias.copy_from_slice(&read_i16s(r, HIDDEN).context("read feature bias")?);
    let mut our_weights = [0i16; HIDDEN];
    our_weights.copy_from_slice(&read_i16s(r, HIDDEN).context("read output weights")?);
    let mut their_weights = [0i16; HIDDEN];
    their_weights.copy_from_slice(&read_i16s(r, HIDDEN).context("read output weights")?);
    let output_bias = read_u32(r).context("read output bias")? as i32;
    let scale = read_u32(r).context("read scale")? as i32;
    if scale == 0 {
        bail!(NetworkError::ZeroScale);
    }

    Ok(Network { feature_weights, feature_bias, our_weights, their_weights, output_bias, scale })
}

fn read_u32<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut b4 = [0u8; 4];
    r.read_exact(&mut b4)?;
    Ok(u32::from_le_bytes(b4))
}

fn read_i16s<R: Read>(r: &mut R, n: usize) -> std::io::Result<Vec<i16>> {
    let mut buf = vec![0u8; n * 2];
    r.read_exact(&mut buf)?;
    Ok(buf.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect())
}
