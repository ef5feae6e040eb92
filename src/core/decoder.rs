use crate::domain::model::{
    HotelId, InventoryRecord, PriceTuple, RateRecord, RecordBatch, SectionBody, SectionTag,
};
use crate::domain::ports::SectionDecoder;
use regex::Regex;
use std::sync::{Arc, LazyLock};

const FIELD_SEPARATOR: char = ':';
const INVENTORY_MIN_FIELDS: usize = 6;
const RATE_MIN_FIELDS: usize = 10;
const DEFAULT_RATE_TYPE: &str = "N";

static PRICE_TUPLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^,]*),([^,]*),([^)]+)\)").expect("valid price tuple pattern"));

/// `SIIN` 區段：每行一筆庫存紀錄
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryDecoder;

impl SectionDecoder for InventoryDecoder {
    fn tag(&self) -> SectionTag {
        SectionTag::Inventory
    }

    fn decode_line(&self, hotel_id: HotelId, line: &str, out: &mut RecordBatch) {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() < INVENTORY_MIN_FIELDS {
            tracing::trace!("Dropping short SIIN line ({} fields)", fields.len());
            return;
        }

        // fields[2] 不使用
        out.inventory.push(InventoryRecord {
            hotel_id,
            room_code: fields[3].to_string(),
            board_code: fields[4].to_string(),
            date_from: fields[0].to_string(),
            date_to: fields[1].to_string(),
            availability_data: fields[5].to_string(),
        });
    }
}

/// `SIAP` 區段：價格清單中每個價格 > 0 的 tuple 產生一筆房價
#[derive(Debug, Default, Clone, Copy)]
pub struct RateDecoder;

impl SectionDecoder for RateDecoder {
    fn tag(&self) -> SectionTag {
        SectionTag::Rates
    }

    fn decode_line(&self, hotel_id: HotelId, line: &str, out: &mut RecordBatch) {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() < RATE_MIN_FIELDS {
            tracing::trace!("Dropping short SIAP line ({} fields)", fields.len());
            return;
        }

        let adults = fields[6].trim().parse::<i32>().unwrap_or(0);

        for tuple in parse_price_tuples(fields[9]) {
            let Some(price) = tuple.price.filter(|p| *p > 0.0) else {
                continue;
            };

            out.rates.push(RateRecord {
                hotel_id,
                room_code: fields[3].to_string(),
                board_code: fields[4].to_string(),
                date_from: fields[0].to_string(),
                date_to: fields[1].to_string(),
                rate_type: DEFAULT_RATE_TYPE.to_string(),
                base_price: 0.0,
                tax_amount: 0.0,
                adults,
                board_type: fields[4].to_string(),
                price,
            });
        }
    }
}

/// 解析 `(a,b,c)(a,b,c)...`，群組之間不需要分隔符
pub fn parse_price_tuples(field: &str) -> impl Iterator<Item = PriceTuple<'_>> {
    PRICE_TUPLE_PATTERN.captures_iter(field).map(|caps| {
        let (_, [first, second, price]) = caps.extract();
        PriceTuple {
            first,
            second,
            price: price
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite()),
        }
    })
}

/// 標籤到解碼策略的對應；未登錄的標籤不產生紀錄
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: Vec<Arc<dyn SectionDecoder>>,
}

impl DecoderRegistry {
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn SectionDecoder>) -> Self {
        let tag = decoder.tag();
        self.decoders.retain(|d| d.tag() != tag);
        self.decoders.push(decoder);
        self
    }

    pub fn decoder_for(&self, tag: &SectionTag) -> Option<&dyn SectionDecoder> {
        self.decoders
            .iter()
            .find(|d| &d.tag() == tag)
            .map(|d| d.as_ref())
    }

    pub fn decode_section(&self, hotel_id: HotelId, section: &SectionBody) -> RecordBatch {
        let mut batch = RecordBatch::default();

        match self.decoder_for(&section.tag) {
            Some(decoder) => {
                for line in &section.lines {
                    decoder.decode_line(hotel_id, line, &mut batch);
                }
            }
            None => {
                tracing::debug!(
                    "Section {{{}}} has no decoder, {} lines passed through",
                    section.tag,
                    section.lines.len()
                );
            }
        }

        batch
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::empty()
            .with_decoder(Arc::new(InventoryDecoder))
            .with_decoder(Arc::new(RateDecoder))
    }
}
