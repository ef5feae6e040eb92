use crate::domain::model::TableRow;
use crate::domain::ports::RecordSink;
use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// 輸出串流的寫出設定
#[derive(Debug, Clone, Copy)]
pub struct SinkOptions {
    pub delimiter: u8,
    pub include_header: bool,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            include_header: true,
        }
    }
}

/// 以 csv 寫出單一資料表；開啟時截斷既有內容
pub struct CsvSink<R: TableRow> {
    path: PathBuf,
    writer: Option<csv::Writer<BufWriter<File>>>,
    rows: u64,
    _row: PhantomData<fn(R)>,
}

impl<R: TableRow> CsvSink<R> {
    pub fn open(destination: impl AsRef<Path>, options: SinkOptions) -> Result<Self> {
        let path = destination.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        if options.include_header {
            writer.write_record(R::COLUMNS)?;
        }

        tracing::debug!("Opened {} sink at {}", R::TABLE, path.display());

        Ok(Self {
            path,
            writer: Some(writer),
            rows: 0,
            _row: PhantomData,
        })
    }
}

fn closed_error<R: TableRow>() -> EtlError {
    EtlError::SinkError {
        stream: R::TABLE.to_string(),
        message: "sink already closed".to_string(),
    }
}

impl<R: TableRow> RecordSink<R> for CsvSink<R> {
    fn write(&mut self, record: &R) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(closed_error::<R>());
        };
        writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<u64> {
        let mut writer = self.writer.take().ok_or_else(closed_error::<R>)?;
        writer.flush()?;
        let inner = writer.into_inner().map_err(|e| EtlError::SinkError {
            stream: R::TABLE.to_string(),
            message: e.error().to_string(),
        })?;
        inner.into_inner().map_err(|e| EtlError::SinkError {
            stream: R::TABLE.to_string(),
            message: e.error().to_string(),
        })?;

        tracing::debug!(
            "Closed {} sink at {} with {} rows",
            R::TABLE,
            self.path.display(),
            self.rows
        );
        Ok(self.rows)
    }
}

/// 單一 writer 迴圈：從佇列取出批次並寫入，通道關閉後 close
///
/// 在 blocking 執行緒上執行；所有 sender 被 drop 後結束。
pub fn drain_into_sink<R, S>(mut sink: S, mut receiver: mpsc::Receiver<Vec<R>>) -> Result<u64>
where
    R: TableRow,
    S: RecordSink<R>,
{
    while let Some(batch) = receiver.blocking_recv() {
        for record in &batch {
            if let Err(e) = sink.write(record) {
                // 讓送出端立即得知 writer 已失效
                receiver.close();
                return Err(e);
            }
        }
    }
    sink.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{HotelId, InventoryRecord, RateRecord};
    use tempfile::TempDir;

    fn inventory(room: &str) -> InventoryRecord {
        InventoryRecord {
            hotel_id: HotelId(42),
            room_code: room.to_string(),
            board_code: "BB".to_string(),
            date_from: "20240101".to_string(),
            date_to: "20240131".to_string(),
            availability_data: "(0,5)".to_string(),
        }
    }

    #[test]
    fn test_header_written_even_without_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hotel_inventory.csv");

        let mut sink = CsvSink::<InventoryRecord>::open(&path, SinkOptions::default()).unwrap();
        assert_eq!(sink.close().unwrap(), 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "hotel_id,room_code,board_code,date_from,date_to,availability_data\n"
        );
    }

    #[test]
    fn test_rows_follow_column_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("hotel_rates.csv");

        let mut sink = CsvSink::<RateRecord>::open(&path, SinkOptions::default()).unwrap();
        sink.write(&RateRecord {
            hotel_id: HotelId(7),
            room_code: "DBL".to_string(),
            board_code: "HB".to_string(),
            date_from: "20240101".to_string(),
            date_to: "20240131".to_string(),
            rate_type: "N".to_string(),
            base_price: 0.0,
            tax_amount: 0.0,
            adults: 2,
            board_type: "HB".to_string(),
            price: 45.5,
        })
        .unwrap();
        assert_eq!(sink.close().unwrap(), 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), RateRecord::COLUMNS);

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "7");
        assert_eq!(&row[5], "N");
        assert_eq!(&row[8], "2");
        assert_eq!(&row[9], "HB");
        assert_eq!(row[10].parse::<f64>().unwrap(), 45.5);
        assert_eq!(row[6].parse::<f64>().unwrap(), 0.0);
    }

    #[test]
    fn test_open_truncates_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hotel_inventory.csv");
        std::fs::write(&path, "stale,data\nfrom,previous run\n").unwrap();

        let options = SinkOptions {
            delimiter: b'\t',
            include_header: false,
        };
        let mut sink = CsvSink::<InventoryRecord>::open(&path, options).unwrap();
        sink.write(&inventory("DBL")).unwrap();
        sink.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "42\tDBL\tBB\t20240101\t20240131\t(0,5)\n");
    }

    #[test]
    fn test_write_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hotel_inventory.csv");

        let mut sink = CsvSink::<InventoryRecord>::open(&path, SinkOptions::default()).unwrap();
        sink.close().unwrap();
        assert!(matches!(
            sink.write(&inventory("DBL")),
            Err(EtlError::SinkError { .. })
        ));
        assert!(sink.close().is_err());
    }

    #[tokio::test]
    async fn test_drain_into_sink_counts_all_batches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hotel_inventory.csv");
        let sink = CsvSink::<InventoryRecord>::open(&path, SinkOptions::default()).unwrap();

        let (tx, rx) = mpsc::channel(2);
        let writer = tokio::task::spawn_blocking(move || drain_into_sink(sink, rx));

        tx.send(vec![inventory("A"), inventory("B")]).await.unwrap();
        tx.send(vec![inventory("C")]).await.unwrap();
        drop(tx);

        let rows = writer.await.unwrap().unwrap();
        assert_eq!(rows, 3);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }
}
