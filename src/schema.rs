//! Static table catalog. Every SQL identifier the store emits comes from here; values are always parameters.

/// Column default applied when an insert omits the column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnDefault {
    Bool(bool),
    Text(&'static str),
}

impl ColumnDefault {
    pub fn sql(&self) -> String {
        match self {
            ColumnDefault::Bool(b) => b.to_string().to_uppercase(),
            ColumnDefault::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    pub fn value(&self) -> serde_json::Value {
        match self {
            ColumnDefault::Bool(b) => serde_json::Value::Bool(*b),
            ColumnDefault::Text(s) => serde_json::Value::String((*s).to_string()),
        }
    }
}

#[derive(Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    /// PostgreSQL type, also used as the cast on bound parameters (e.g. `$3::date`).
    pub pg_type: &'static str,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
    /// Foreign key target (table name, column). Deletes of referenced rows are restricted.
    pub references: Option<(&'static str, &'static str)>,
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub pk: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == self.pk || self.column(name).is_some()
    }

    /// SQL type for a column, including the primary key.
    pub fn pg_type(&self, name: &str) -> Option<&'static str> {
        if name == self.pk {
            return Some("integer");
        }
        self.column(name).map(|c| c.pg_type)
    }

    pub fn unique_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.unique)
    }
}

const fn col(name: &'static str, pg_type: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        pg_type,
        nullable: true,
        unique: false,
        default: None,
        references: None,
    }
}

const fn required(name: &'static str, pg_type: &'static str) -> ColumnDef {
    ColumnDef {
        nullable: false,
        ..col(name, pg_type)
    }
}

const fn unique(name: &'static str, pg_type: &'static str, nullable: bool) -> ColumnDef {
    ColumnDef {
        nullable,
        unique: true,
        ..col(name, pg_type)
    }
}

const fn fk(name: &'static str, table: &'static str, column: &'static str, nullable: bool) -> ColumnDef {
    ColumnDef {
        nullable,
        references: Some((table, column)),
        ..col(name, "integer")
    }
}

const fn with_default(name: &'static str, pg_type: &'static str, default: ColumnDefault) -> ColumnDef {
    ColumnDef {
        nullable: false,
        default: Some(default),
        ..col(name, pg_type)
    }
}

pub static USERS: TableDef = TableDef {
    name: "usuarios",
    pk: "idUsuario",
    columns: &[
        required("nome", "text"),
        unique("email", "text", false),
        unique("cpf", "text", true),
        required("senha", "text"),
        with_default("permissoesDoUsuario", "text", ColumnDefault::Text("[]")),
        col("tokenResetSenha", "text"),
        col("usuarioCriadorId", "integer"),
        col("nomeFantasia", "text"),
        col("razaoSocial", "text"),
        col("nomeContato", "text"),
        col("telefone", "text"),
        col("estado", "text"),
        col("cidade", "text"),
        with_default("bloqueado", "boolean", ColumnDefault::Bool(false)),
    ],
};

pub static ACCOUNT_TYPES: TableDef = TableDef {
    name: "tipo_conta",
    pk: "idTipoConta",
    columns: &[unique("tipoDaConta", "text", false)],
};

pub static ACCOUNTS: TableDef = TableDef {
    name: "conta",
    pk: "idConta",
    columns: &[
        fk("usuarioId", "usuarios", "idUsuario", false),
        fk("planoId", "plano", "idPlano", true),
        fk("tipoDaContaId", "tipo_conta", "idTipoConta", true),
    ],
};

pub static SUB_ACCOUNTS: TableDef = TableDef {
    name: "subContas",
    pk: "idSubContas",
    columns: &[
        required("nome", "text"),
        unique("email", "text", false),
        col("cpf", "text"),
        required("senha", "text"),
        col("tokenResetSenha", "text"),
        fk("contaPaiId", "conta", "idConta", true),
        with_default("bloqueado", "boolean", ColumnDefault::Bool(false)),
    ],
};

pub static PLANS: TableDef = TableDef {
    name: "plano",
    pk: "idPlano",
    columns: &[
        unique("nomePlano", "text", false),
        col("tipoDoPlano", "text"),
        col("taxaInscricao", "double precision"),
        col("taxaComissao", "double precision"),
        col("taxaManutencaoAnual", "double precision"),
    ],
};

pub static CATEGORIES: TableDef = TableDef {
    name: "categoria",
    pk: "idCategoria",
    columns: &[
        unique("nomeCategoria", "text", false),
        col("tipoCategoria", "text"),
    ],
};

pub static SUBCATEGORIES: TableDef = TableDef {
    name: "subcategoria",
    pk: "idSubcategoria",
    columns: &[
        required("nomeSubcategoria", "text"),
        fk("categoriaId", "categoria", "idCategoria", false),
    ],
};

pub static INVOICES: TableDef = TableDef {
    name: "cobranca",
    pk: "idCobranca",
    columns: &[
        required("valorFatura", "double precision"),
        with_default("status", "text", ColumnDefault::Text("Pendente")),
        col("transacaoId", "integer"),
        fk("usuarioId", "usuarios", "idUsuario", true),
        fk("contaId", "conta", "idConta", true),
        fk("subContaId", "subContas", "idSubContas", true),
        col("vencimentoFatura", "date"),
        col("referencia", "text"),
    ],
};

/// All tables in dependency order (referenced tables first).
pub static ALL_TABLES: &[&TableDef] = &[
    &USERS,
    &ACCOUNT_TYPES,
    &PLANS,
    &ACCOUNTS,
    &SUB_ACCOUNTS,
    &CATEGORIES,
    &SUBCATEGORIES,
    &INVOICES,
];

pub fn table_by_name(name: &str) -> Option<&'static TableDef> {
    ALL_TABLES.iter().copied().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_keys_point_at_known_tables() {
        for table in ALL_TABLES {
            for c in table.columns {
                if let Some((target, column)) = c.references {
                    let t = table_by_name(target).expect("referenced table exists");
                    assert_eq!(t.pk, column, "{}.{} must reference a primary key", table.name, c.name);
                }
            }
        }
    }

    #[test]
    fn referenced_tables_come_first() {
        for (i, table) in ALL_TABLES.iter().enumerate() {
            for c in table.columns {
                if let Some((target, _)) = c.references {
                    let pos = ALL_TABLES.iter().position(|t| t.name == target).unwrap();
                    assert!(pos < i, "{} must be created before {}", target, table.name);
                }
            }
        }
    }

    #[test]
    fn pk_is_integer_and_known() {
        assert!(USERS.has_column("idUsuario"));
        assert_eq!(USERS.pg_type("idUsuario"), Some("integer"));
        assert_eq!(INVOICES.pg_type("vencimentoFatura"), Some("date"));
        assert!(!USERS.has_column("ofertas"));
    }
}
