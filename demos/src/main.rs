use anyhow::Result;
use rtsp_rtp_client::{Client, Protocol};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let rtsp_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "rtsp://192.168.86.138:554/stream1".to_string());

    let mut client = Client::new(Protocol::Tcp, &rtsp_url)?;

    if !client.connect().await? {
        eprintln!("[demo] failed to reach Playing state");
        return Ok(());
    }
    println!("[demo] connected, streaming to video.h264");

    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })?;

    let path = Path::new("video.h264");
    let mut file = File::create(&path).await?;

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                println!("[demo] received ctrl-c, disconnecting");
                break;
            }
            frame = client.read_frame() => {
                match frame {
                    Some((bytes, extension_words)) => {
                        if !extension_words.is_empty() {
                            println!("[demo] frame start, exposure words: {extension_words:?}");
                        }
                        file.write_all(&bytes).await?;
                    }
                    None => {
                        println!("[demo] session closed");
                        break;
                    }
                }
            }
        }
    }

    client.disconnect();
    Ok(())
}
