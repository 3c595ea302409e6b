use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::newgrf::NewGrfLookup;

/// Map terrain style reported by a server, decoded from a single `u8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Landscape {
    Temperate,
    Arctic,
    Tropical,
    Toyland,
    /// Any value outside `0..=3`.
    Unknown,
}

impl Landscape {
    fn from_wire(value: u8) -> Self {
        match value {
            0 => Landscape::Temperate,
            1 => Landscape::Arctic,
            2 => Landscape::Tropical,
            3 => Landscape::Toyland,
            _ => Landscape::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Landscape::Temperate => "Temperate",
            Landscape::Arctic => "Arctic",
            Landscape::Tropical => "Tropical",
            Landscape::Toyland => "Toyland",
            Landscape::Unknown => "Unknown",
        }
    }
}

/// One decoded entry from a `GC_LISTING` packet.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerRecord {
    pub connection_string: String,
    pub info_version: u8,
    pub ticks_playing: Option<u64>,
    pub newgrfs: Vec<String>,
    pub gamescript_name: Option<String>,
    pub gamescript_version: Option<i32>,
    pub calendar_date: Option<i32>,
    pub calendar_start: Option<i32>,
    pub companies_on: Option<u8>,
    pub companies_max: Option<u8>,
    pub spectators_max: Option<u8>,
    pub name: String,
    pub version: String,
    pub password: bool,
    pub clients_max: u8,
    pub clients_on: u8,
    pub spectators_on: u8,
    pub map_width: u16,
    pub map_height: u16,
    pub landscape: Landscape,
    pub dedicated: bool,
}

/// Resolution of an invite code, as returned by the coordinator's
/// `GC_DIRECT_CONNECT`/`GC_TURN_CONNECT` packets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InviteResolution {
    Direct { host: String, port: u16 },
    Relay {
        host: String,
        port: u16,
        ticket: String,
    },
}

/// Decodes the full body of a `GC_LISTING` packet: `u16le serverCount`
/// followed by that many records. A malformed record stops decoding and
/// returns whatever was already decoded; the overall server count is
/// advisory only.
pub fn decode_listing(payload: &[u8], lookup: &mut NewGrfLookup) -> Vec<ServerRecord> {
    let mut cursor = Cursor::new(payload);

    let count = match cursor.read_u16_le() {
        Ok(n) => n,
        Err(_) => return Vec::new(),
    };

    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        match decode_one_record(&mut cursor, lookup) {
            Ok(record) => out.push(record),
            Err(_) => break,
        }
    }
    out
}

fn decode_one_record(
    cursor: &mut Cursor<'_>,
    lookup: &mut NewGrfLookup,
) -> Result<ServerRecord, DecodeError> {
    let connection_string = cursor.read_zstring()?;
    let info_version = cursor.read_u8()?;

    let ticks_playing = if info_version >= 7 {
        Some(cursor.read_u64_le()?)
    } else {
        None
    };

    let newgrf_type = if info_version >= 6 {
        cursor.read_u8()?
    } else {
        0
    };

    let (gamescript_version, gamescript_name) = if info_version >= 5 {
        let version = cursor.read_i32_le()?;
        let name = cursor.read_zstring()?;
        (Some(version), Some(name))
    } else {
        (None, None)
    };

    let mut newgrfs = Vec::new();
    if info_version >= 4 {
        let grf_count = cursor.read_u8()?;
        for _ in 0..grf_count {
            if let Some(display) = decode_newgrf_entry(cursor, newgrf_type, lookup)? {
                newgrfs.push(display);
            }
        }
    }

    let (calendar_date, calendar_start) = if info_version >= 3 {
        let date = cursor.read_i32_le()?;
        let start = cursor.read_i32_le()?;
        (Some(date), Some(start))
    } else {
        (None, None)
    };

    let (companies_max, companies_on, spectators_max) = if info_version >= 2 {
        let max = cursor.read_u8()?;
        let on = cursor.read_u8()?;
        let spec_max = cursor.read_u8()?;
        (Some(max), Some(on), Some(spec_max))
    } else {
        (None, None, None)
    };

    let name = cursor.read_zstring()?;
    let version = cursor.read_zstring()?;

    if info_version <= 5 {
        let _language = cursor.read_u8()?;
    }

    let password = cursor.read_u8()? != 0;
    let clients_max = cursor.read_u8()?;
    let clients_on = cursor.read_u8()?;
    let spectators_on = cursor.read_u8()?;

    if info_version <= 2 {
        let _legacy_dates = cursor.read_bytes(4)?;
    }

    if info_version <= 5 {
        let _map_name = cursor.read_zstring()?;
    }

    let map_width = cursor.read_u16_le()?;
    let map_height = cursor.read_u16_le()?;
    let landscape = Landscape::from_wire(cursor.read_u8()?);
    let dedicated = cursor.read_u8()? != 0;

    Ok(ServerRecord {
        connection_string,
        info_version,
        ticks_playing,
        newgrfs,
        gamescript_name,
        gamescript_version,
        calendar_date,
        calendar_start,
        companies_on,
        companies_max,
        spectators_max,
        name,
        version,
        password,
        clients_max,
        clients_on,
        spectators_on,
        map_width,
        map_height,
        landscape,
        dedicated,
    })
}

/// Decodes one NewGRF entry. Returns `Ok(None)` when the entry is a lookup
/// index that doesn't resolve against `lookup` — that's not a decode error,
/// just a dropped display string.
fn decode_newgrf_entry(
    cursor: &mut Cursor<'_>,
    newgrf_type: u8,
    lookup: &NewGrfLookup,
) -> Result<Option<String>, DecodeError> {
    match newgrf_type {
        0 => {
            let grf_id = cursor.read_u32_le()?;
            let _md5 = cursor.read_md5()?;
            Ok(Some(format!("{grf_id:08X}")))
        }
        1 => {
            let _grf_id = cursor.read_u32_le()?;
            let _md5 = cursor.read_md5()?;
            let name = cursor.read_zstring()?;
            Ok(Some(name))
        }
        _ => {
            let index = cursor.read_u32_le()?;
            Ok(lookup.get(index).map(|record| record.name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newgrf::NewGrfRecord;

    fn v2_fixture() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"127.0.0.1:3979\0"); // connection_string
        buf.push(2); // info_version
        buf.push(2); // companies_max
        buf.push(1); // companies_on
        buf.push(4); // spectators_max
        buf.extend_from_slice(b"My Server\0"); // name
        buf.extend_from_slice(b"1.0\0"); // version
        buf.push(0); // language (<=5)
        buf.push(0); // password
        buf.push(8); // clients_max
        buf.push(1); // clients_on
        buf.push(0); // spectators_on
        buf.extend_from_slice(&[0, 0, 0, 0]); // legacy dates (<=2)
        buf.extend_from_slice(b"map\0"); // map_name (<=5)
        buf.extend_from_slice(&256u16.to_le_bytes()); // map_width
        buf.extend_from_slice(&256u16.to_le_bytes()); // map_height
        buf.push(1); // landscape = Arctic
        buf.push(1); // dedicated
        buf
    }

    #[test]
    fn decodes_a_v2_record() {
        let payload = v2_fixture();
        let mut cursor = Cursor::new(&payload);
        let mut lookup = NewGrfLookup::new();
        let record = decode_one_record(&mut cursor, &mut lookup).unwrap();

        assert_eq!(record.connection_string, "127.0.0.1:3979");
        assert_eq!(record.info_version, 2);
        assert_eq!(record.ticks_playing, None);
        assert_eq!(record.companies_max, Some(2));
        assert_eq!(record.companies_on, Some(1));
        assert_eq!(record.spectators_max, Some(4));
        assert_eq!(record.name, "My Server");
        assert_eq!(record.version, "1.0");
        assert!(!record.password);
        assert_eq!(record.clients_max, 8);
        assert_eq!(record.map_width, 256);
        assert_eq!(record.landscape, Landscape::Arctic);
        assert!(record.dedicated);
        assert!(cursor.is_empty());
    }

    #[test]
    fn listing_with_zero_count_yields_no_records() {
        let mut lookup = NewGrfLookup::new();
        let records = decode_listing(&0u16.to_le_bytes(), &mut lookup);
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_record_keeps_prior_ones() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u16.to_le_bytes()); // serverCount = 2
        payload.extend_from_slice(&v2_fixture());
        payload.push(0xFF); // truncated second record: just a dangling byte

        let mut lookup = NewGrfLookup::new();
        let records = decode_listing(&payload, &mut lookup);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn newgrf_type2_unknown_index_is_dropped_without_error() {
        let mut payload = b"srv\0".to_vec();
        payload.push(7); // info_version >= 7 so newgrf_type is read
        payload.extend_from_slice(&0u64.to_le_bytes()); // ticks_playing
        payload.push(2); // newgrf_type = 2 (indexed)
        payload.extend_from_slice(&0i32.to_le_bytes()); // gamescript_version
        payload.push(0); // gamescript_name = ""
        payload.push(1); // grf_count = 1
        payload.extend_from_slice(&999u32.to_le_bytes()); // unknown lookup index
        payload.extend_from_slice(&0i32.to_le_bytes()); // calendar_date
        payload.extend_from_slice(&0i32.to_le_bytes()); // calendar_start
        payload.push(0); // companies_max
        payload.push(0); // companies_on
        payload.push(0); // spectators_max
        payload.push(0); // name = ""
        payload.push(0); // version = ""
        payload.push(0); // password
        payload.push(0); // clients_max
        payload.push(0); // clients_on
        payload.push(0); // spectators_on
        payload.extend_from_slice(&0u16.to_le_bytes()); // map_width
        payload.extend_from_slice(&0u16.to_le_bytes()); // map_height
        payload.push(0); // landscape
        payload.push(0); // dedicated

        let mut cursor = Cursor::new(&payload);
        let mut lookup = NewGrfLookup::new();
        let record = decode_one_record(&mut cursor, &mut lookup).unwrap();
        assert!(record.newgrfs.is_empty());
    }

    #[test]
    fn newgrf_type2_known_index_resolves_name() {
        let mut lookup = NewGrfLookup::new();
        lookup.insert(
            5,
            NewGrfRecord {
                grf_id: 1,
                md5: [0; 16],
                name: "Opening GRF".into(),
            },
        );

        let mut payload = b"srv\0".to_vec();
        payload.push(7);
        payload.extend_from_slice(&0u64.to_le_bytes());
        payload.push(2);
        payload.extend_from_slice(&0i32.to_le_bytes());
        payload.push(0);
        payload.push(1);
        payload.extend_from_slice(&5u32.to_le_bytes());
        payload.extend_from_slice(&0i32.to_le_bytes());
        payload.extend_from_slice(&0i32.to_le_bytes());
        payload.push(0);
        payload.push(0);
        payload.push(0);
        payload.push(0);
        payload.push(0);
        payload.push(0);
        payload.push(0);
        payload.push(0);
        payload.push(0);
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.push(0);
        payload.push(0);

        let mut cursor = Cursor::new(&payload);
        let record = decode_one_record(&mut cursor, &mut lookup).unwrap();
        assert_eq!(record.newgrfs, vec!["Opening GRF".to_string()]);
    }

    #[test]
    fn unknown_landscape_value_becomes_unknown() {
        assert_eq!(Landscape::from_wire(9), Landscape::Unknown);
        assert_eq!(Landscape::from_wire(0), Landscape::Temperate);
    }
}
