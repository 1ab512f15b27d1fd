use std::borrow::Cow;
use std::fmt;

/// Messages shown to the person filling in the purchase form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    InvoiceNumberRequired,
    InvoiceNumberTaken,
    /// Only raised when check failures are configured to be reported.
    CheckFailed(String),
    Saved,
    SaveFailed(String),
}

impl Alert {
    /// Fixed alerts borrow their text; only the ones carrying a detail
    /// allocate.
    pub fn text(&self) -> Cow<'static, str> {
        match self {
            Alert::InvoiceNumberRequired => Cow::Borrowed("Nomor faktur harus diisi!"),
            Alert::InvoiceNumberTaken => {
                Cow::Borrowed("Nomor faktur sudah digunakan. Silakan gunakan yang lain.")
            }
            Alert::CheckFailed(detail) => Cow::Owned(format!("Gagal memeriksa nomor faktur: {detail}")),
            Alert::Saved => Cow::Borrowed("Data berhasil disimpan!"),
            Alert::SaveFailed(detail) => Cow::Owned(format!("Gagal menyimpan data: {detail}")),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Alert::Saved)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::CheckFailed(detail) => write!(f, "Gagal memeriksa nomor faktur: {detail}"),
            Alert::SaveFailed(detail) => write!(f, "Gagal menyimpan data: {detail}"),
            fixed => f.write_str(&fixed.text()),
        }
    }
}
