//! Demo candidates and voters, installed into an empty election when
//! `seed_demo` is configured.

use rocket::serde::json::serde_json;

use super::{
    ballot::Slate,
    roster::Roster,
    store::{Persisted, StoreError},
};

/// Token payload of the seeded voter `budi_santoso`.
pub const BUDI_TOKEN: &str = "UNIQUE_ID: 345678901234567\nNISN: 1234567892\nNama: Budi Santoso\nUsername: budi_santoso\nTempat Lahir: Surabaya\nTanggal Lahir: 2005-12-10";

const DEMO_SLATE: &str = r#"[
    {
        "id": "1",
        "name": "Ahmad Rizki Pratama",
        "class": "XI IPA 1",
        "vision": "Mewujudkan OSIS yang inovatif, kreatif, dan berprestasi untuk kemajuan sekolah",
        "mission": "Meningkatkan kegiatan ekstrakurikuler, memperkuat solidaritas antar siswa, dan menciptakan lingkungan sekolah yang kondusif",
        "photo": "https://placeholder-image-service.onrender.com/image/200x200?prompt=Indonesian%20male%20student%20in%20school%20uniform",
        "votes": 0
    },
    {
        "id": "2",
        "name": "Siti Nurhaliza Dewi",
        "class": "XI IPS 2",
        "vision": "Membangun OSIS yang transparan, demokratis, dan peduli terhadap aspirasi seluruh siswa",
        "mission": "Mengoptimalkan program kerja OSIS, meningkatkan fasilitas siswa, dan memperkuat hubungan dengan alumni",
        "photo": "https://placeholder-image-service.onrender.com/image/200x200?prompt=Indonesian%20female%20student%20in%20school%20uniform",
        "votes": 0
    }
]"#;

// Nobody has voted yet, matching the zero tallies above.
const DEMO_ROSTER: &str = r#"[
    {
        "id": "1",
        "username": "andi_pratama",
        "password": "andi123",
        "nisn": "1234567890",
        "fullName": "Andi Pratama",
        "birthPlace": "Jakarta",
        "birthDate": "2006-05-15",
        "isVerified": true,
        "hasVoted": false,
        "uniqueId": "123456789012345"
    },
    {
        "id": "2",
        "username": "sari_dewi",
        "password": "sari123",
        "nisn": "1234567891",
        "fullName": "Sari Dewi",
        "birthPlace": "Bandung",
        "birthDate": "2006-03-20",
        "isVerified": false,
        "hasVoted": false,
        "uniqueId": "234567890123456"
    },
    {
        "id": "3",
        "username": "budi_santoso",
        "password": "budi123",
        "nisn": "1234567892",
        "fullName": "Budi Santoso",
        "birthPlace": "Surabaya",
        "birthDate": "2005-12-10",
        "isVerified": true,
        "hasVoted": false,
        "uniqueId": "345678901234567"
    }
]"#;

fn parse<T: Persisted>(json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(|source| StoreError::Format {
        key: T::KEY,
        source,
    })
}

pub fn demo_slate() -> Result<Slate, StoreError> {
    parse(DEMO_SLATE)
}

pub fn demo_roster() -> Result<Roster, StoreError> {
    parse(DEMO_ROSTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{id::Id, token};

    #[test]
    fn demo_data_parses() {
        let slate = demo_slate().unwrap();
        assert_eq!(2, slate.len());
        assert_eq!(0, slate.total_votes());

        let roster = demo_roster().unwrap();
        assert_eq!(3, roster.len());
        assert!(roster.voters().iter().all(|voter| !voter.has_voted));
    }

    #[test]
    fn budi_token_matches_the_roster() {
        let roster = demo_roster().unwrap();
        let budi = roster.get(&Id::from("3")).unwrap();
        assert_eq!(BUDI_TOKEN, token::encode(budi));
    }
}
