//! Positional layouts of the four CSV exports.
//!
//! Columns are addressed by zero-based position, never by header text: the
//! clients export carries two columns both headed `embedding`, the first of
//! which actually holds education.

/// Static description of one CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLayout {
    /// File name inside the CSV directory.
    pub file_name: &'static str,
    /// Table the file is loaded into.
    pub table: &'static str,
    /// Rows with fewer fields are skipped.
    pub min_columns: usize,
}

pub const CLIENTS: FileLayout = FileLayout {
    file_name: "clients.csv",
    table: "clients",
    min_columns: 17,
};

pub const CONSULTATION: FileLayout = FileLayout {
    file_name: "consultation.csv",
    table: "consultation",
    min_columns: 3,
};

pub const TRAINING: FileLayout = FileLayout {
    file_name: "training.csv",
    table: "training",
    min_columns: 3,
};

pub const EMPLOYMENTS: FileLayout = FileLayout {
    file_name: "employments.csv",
    table: "employments",
    min_columns: 5,
};

/// Column positions in clients.csv.
pub mod clients {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const BIRTH_DATE: usize = 2;
    pub const RESIDENT_ID: usize = 3;
    pub const PHONE: usize = 4;
    pub const AGE: usize = 5;
    pub const GENDER: usize = 6;
    /// Headed `embedding` in the export.
    pub const EDUCATION: usize = 7;
    pub const BUSINESS_TYPE: usize = 8;
    pub const JOIN_TYPE: usize = 9;
    pub const JOIN_STAGE: usize = 10;
    pub const COMPETENCY: usize = 11;
    pub const DESIRED_JOB: usize = 12;
    pub const ADDRESS: usize = 13;
    pub const UNIVERSITY: usize = 14;
    pub const MAJOR: usize = 15;
    // 16 is the second `embedding` column and is never read.
    /// Optional.
    pub const CREATED_AT: usize = 17;
    /// Optional.
    pub const UPDATED_AT: usize = 18;
}

/// Column positions shared by the three child exports.
pub mod child {
    pub const ID: usize = 0;
    pub const CLIENT_ID: usize = 1;
}

pub mod consultation {
    pub const SUMMARY: usize = 2;
}

pub mod training {
    pub const COURSE_NAME: usize = 2;
}

pub mod employments {
    pub const JOB_TITLE: usize = 2;
    pub const COMPANY_NAME: usize = 3;
    pub const SALARY: usize = 4;
}

/// Every layout, in load order.
pub const ALL: [FileLayout; 4] = [CLIENTS, CONSULTATION, TRAINING, EMPLOYMENTS];

// Every position a loader reads unconditionally must lie below the minimum.
const _: () = assert!(CLIENTS.min_columns > clients::MAJOR);
const _: () = assert!(CONSULTATION.min_columns > consultation::SUMMARY);
const _: () = assert!(TRAINING.min_columns > training::COURSE_NAME);
const _: () = assert!(EMPLOYMENTS.min_columns > employments::SALARY);
