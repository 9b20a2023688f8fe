//! End-to-end checksum verification for the upload/download round
//! trip, grounded on the same `openssl::sha::Sha256` used by the
//! store's checksum plumbing.

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::error::{ClientError, ClientResult};

const READ_BUFFER_SIZE: usize = 64 * 1024;

pub async fn sha256_file(path: &Path) -> ClientResult<[u8; 32]> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|err| ClientError::io(path.display().to_string(), err))?;

    let mut hasher = openssl::sha::Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|err| ClientError::io(path.display().to_string(), err))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finish())
}

/// Compares the checksums of two files, returning `Ok(())` when equal
/// and a descriptive `Validation` error otherwise.
pub async fn verify_round_trip(input_path: &Path, output_path: &Path) -> ClientResult<()> {
    let (input_sum, output_sum) =
        tokio::try_join!(sha256_file(input_path), sha256_file(output_path))?;

    if input_sum != output_sum {
        return Err(ClientError::Validation(format!(
            "checksum mismatch: {} != {}",
            hex_encode(&input_sum),
            hex_encode(&output_sum)
        )));
    }

    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_files_verify() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        tokio::fs::write(&a, b"the same bytes").await.unwrap();
        tokio::fs::write(&b, b"the same bytes").await.unwrap();

        verify_round_trip(&a, &b).await.unwrap();
    }

    #[tokio::test]
    async fn differing_files_fail_verification() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        tokio::fs::write(&a, b"alpha").await.unwrap();
        tokio::fs::write(&b, b"beta").await.unwrap();

        assert!(verify_round_trip(&a, &b).await.is_err());
    }
}
