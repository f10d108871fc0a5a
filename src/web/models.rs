use serde::Deserialize;

/// Login form
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form
#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirmation: String,
}

/// New language form
#[derive(Deserialize)]
pub struct LanguageForm {
    pub language_name: String,
}

/// New table form
#[derive(Deserialize)]
pub struct TableForm {
    pub table_name: String,
}

/// Word pair typed into the table editor
#[derive(Deserialize)]
pub struct WordPairForm {
    #[serde(rename = "foreignWord")]
    pub foreign_word: String,
    pub translation: String,
}

/// Word pair removal from the table editor
#[derive(Deserialize)]
pub struct DeleteWordForm {
    pub word_pair_id: i64,
}

/// Answer to the current quiz question
#[derive(Deserialize)]
pub struct AnswerForm {
    #[serde(default)]
    pub answer: String,
}

/// `/{language_name}` path segment
#[derive(Deserialize)]
pub struct LanguagePath {
    pub language_name: String,
}

/// `/{language_name}/{table_name}` path segments
#[derive(Deserialize)]
pub struct TablePath {
    pub language_name: String,
    pub table_name: String,
}

impl TablePath {
    pub fn edit_url(&self) -> String {
        format!("/edit_table/{}/{}", self.language_name, self.table_name)
    }

    pub fn view_url(&self) -> String {
        format!("/view_table/{}/{}", self.language_name, self.table_name)
    }

    pub fn quiz_url(&self) -> String {
        format!("/quiz/{}/{}", self.language_name, self.table_name)
    }

    pub fn results_url(&self) -> String {
        format!("/quiz_results/{}/{}", self.language_name, self.table_name)
    }

    pub fn language_tables_url(&self) -> String {
        format!("/tables/{}", self.language_name)
    }
}
